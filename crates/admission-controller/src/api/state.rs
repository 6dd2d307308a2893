use crate::controller::AdmissionController;

pub(crate) struct ApiServerState {
    pub(crate) controller: AdmissionController,
}
