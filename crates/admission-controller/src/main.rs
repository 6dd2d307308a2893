use std::sync::Arc;

use admission_controller::{
    cli,
    cluster::{ClusterClient, Disconnected},
    config::Config,
    policy::IsFriday,
    tracing::setup_tracing,
    AdmissionServer,
};
use anyhow::{anyhow, Result};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    // Starting from rustls 0.22, each application must set its default crypto provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the default crypto provider"))?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    info!("Starting admission controller...");

    let cluster = connect_to_cluster(config.ignore_kubernetes_connection_failure).await?;
    info!(
        connected = cluster.is_connected(),
        default_namespace = cluster.default_namespace(),
        "Kubernetes client ready"
    );

    let server = AdmissionServer::new_from_config(&config, cluster, Arc::new(IsFriday::local()));
    server.run().await
}

async fn connect_to_cluster(ignore_connection_failure: bool) -> Result<Arc<dyn ClusterClient>> {
    match kube::Client::try_default().await {
        Ok(client) => Ok(Arc::new(client)),
        Err(e) if ignore_connection_failure => {
            warn!(error = %e, "Cannot connect to Kubernetes, running without a cluster client");
            Ok(Arc::new(Disconnected::default()))
        }
        Err(e) => Err(anyhow!("Error creating Kubernetes client: {e}")),
    }
}
