use std::sync::Arc;

use tracing::Span;

use crate::admission_review::{self, AdmissionRequest};
use crate::cluster::ClusterClient;
use crate::errors::AdmissionError;
use crate::policy::{self, AdmissionVerdict, DecisionPredicate};

/// Response of a completed admission exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionOutcome {
    pub allowed: bool,
    /// Serialized AdmissionReview.
    pub body: Vec<u8>,
}

/// Runs the decode, evaluate, encode pipeline for one admission call at a time.
///
/// Holds no per-request state: concurrent calls share it through an `Arc`.
#[derive(Clone)]
pub struct AdmissionController {
    cluster: Arc<dyn ClusterClient>,
    predicate: Arc<dyn DecisionPredicate>,
}

impl AdmissionController {
    pub fn new(cluster: Arc<dyn ClusterClient>, predicate: Arc<dyn DecisionPredicate>) -> Self {
        AdmissionController { cluster, predicate }
    }

    pub fn cluster(&self) -> &dyn ClusterClient {
        self.cluster.as_ref()
    }

    /// Turn the body of an admission call into the body of its response.
    ///
    /// Once the request is decoded the call always yields an AdmissionReview,
    /// denials included. Errors are reserved to bodies that cannot be
    /// correlated and to serialization failures.
    pub fn handle(&self, body: &[u8]) -> Result<AdmissionOutcome, AdmissionError> {
        let request = admission_review::decode(body)?;
        populate_span_with_admission_request_data(&request);

        let verdict = policy::evaluate(&request, self.predicate.as_ref());
        populate_span_with_verdict(&verdict);

        let body = admission_review::encode(&request.uid, &verdict)?;

        Ok(AdmissionOutcome {
            allowed: verdict.is_allowed(),
            body,
        })
    }
}

fn populate_span_with_admission_request_data(request: &AdmissionRequest) {
    Span::current().record("request_uid", request.uid.as_str());
    Span::current().record("name", request.name.as_deref().unwrap_or_default());
    Span::current().record(
        "namespace",
        request.namespace.as_deref().unwrap_or_default(),
    );
    Span::current().record(
        "operation",
        request.operation.as_deref().unwrap_or_default(),
    );
}

fn populate_span_with_verdict(verdict: &AdmissionVerdict) {
    Span::current().record("allowed", verdict.is_allowed());
    if !verdict.is_allowed() {
        Span::current().record("response_message", verdict.reason());
    }
}
