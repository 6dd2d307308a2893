use std::{net::SocketAddr, sync::Arc, time::Duration};

use admission_controller::{
    cluster::ClusterClient, config::Config, policy::DecisionPredicate, AdmissionServer,
};
use axum::Router;

/// Stands in for a real cluster connection.
pub(crate) struct StubCluster;

impl ClusterClient for StubCluster {
    fn default_namespace(&self) -> &str {
        "default"
    }
}

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        tls_config: None,
        liveness_interval: Duration::from_secs(60),
        ignore_kubernetes_connection_failure: true,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn server(config: &Config, predicate: impl DecisionPredicate + 'static) -> AdmissionServer {
    AdmissionServer::new_from_config(config, Arc::new(StubCluster), Arc::new(predicate))
}

/// Router whose policy denies every request.
pub(crate) fn friday_app() -> Router {
    server(&default_test_config(), || true).router()
}

/// Router whose policy allows every request.
pub(crate) fn weekday_app() -> Router {
    server(&default_test_config(), || false).router()
}
