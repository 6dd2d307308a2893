//! Access to the Kubernetes cluster the webhook is serving.
//!
//! The current policy does not look at the cluster state. The handle is
//! still injected into the [`AdmissionController`](crate::controller::AdmissionController)
//! so policies that need to query the cluster can be plugged in later
//! without changing the request pipeline.

/// The capabilities the admission pipeline may use from the cluster.
#[cfg_attr(test, mockall::automock)]
pub trait ClusterClient: Send + Sync {
    /// The namespace used when a request does not specify one.
    fn default_namespace(&self) -> &str;

    /// Whether a live connection to the API server is available.
    fn is_connected(&self) -> bool {
        true
    }
}

impl ClusterClient for kube::Client {
    fn default_namespace(&self) -> &str {
        kube::Client::default_namespace(self)
    }
}

/// Placeholder used when the webhook runs without access to the cluster.
#[derive(Clone, Debug)]
pub struct Disconnected {
    default_namespace: String,
}

impl Default for Disconnected {
    fn default() -> Self {
        Disconnected {
            default_namespace: String::from("default"),
        }
    }
}

impl ClusterClient for Disconnected {
    fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    fn is_connected(&self) -> bool {
        false
    }
}
