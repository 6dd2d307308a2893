pub mod admission_review;
mod api;
mod certs;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod controller;
pub mod errors;
pub mod policy;
mod supervisor;
#[cfg(test)]
mod test_utils;
pub mod tracing;
mod transport;

use ::tracing::info;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::{tls_rustls::RustlsAcceptor, Handle};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

use crate::api::{
    handlers::{readiness_handler, validate_handler},
    state::ApiServerState,
};
use crate::cluster::ClusterClient;
use crate::config::{Config, TlsConfig, SERVICE_NAME};
use crate::controller::AdmissionController;
use crate::policy::DecisionPredicate;
use crate::transport::WriteErrorAcceptor;

pub use crate::api::MAX_REQUEST_BODY_BYTES;

pub struct AdmissionServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
    liveness_interval: Duration,
    handle: Handle,
}

impl AdmissionServer {
    pub fn new_from_config(
        config: &Config,
        cluster: Arc<dyn ClusterClient>,
        predicate: Arc<dyn DecisionPredicate>,
    ) -> Self {
        let state = Arc::new(ApiServerState {
            controller: AdmissionController::new(cluster, predicate),
        });

        let router = Router::new()
            .route("/validate", post(validate_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self {
            router,
            addr: config.addr,
            tls_config: config.tls_config.clone(),
            liveness_interval: config.liveness_interval,
            handle: Handle::new(),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle of the listener, can be used to find out the bound address.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Serve until SIGINT or SIGTERM is received.
    pub async fn run(self) -> Result<()> {
        self.run_until(supervisor::shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then let in-flight requests complete.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(supervisor::supervise(
            self.handle.clone(),
            self.liveness_interval,
            shutdown,
        ));

        match self.tls_config {
            None => {
                info!(address = %self.addr, service = SERVICE_NAME, "started HTTP server");
                axum_server::bind(self.addr)
                    .acceptor(WriteErrorAcceptor)
                    .handle(self.handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            Some(tls_config) => {
                let rustls_config = certs::create_tls_config(&tls_config).await?;
                info!(address = %self.addr, service = SERVICE_NAME, "started HTTPS server");
                let acceptor = RustlsAcceptor::new(rustls_config).acceptor(WriteErrorAcceptor);
                axum_server::bind(self.addr)
                    .acceptor(acceptor)
                    .handle(self.handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("Admission controller server stopped");
        Ok(())
    }
}
