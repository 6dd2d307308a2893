use std::{future::Future, time::Duration};

use axum_server::Handle;
use tokio::signal;
use tracing::{error, info};

/// How long in-flight admission calls get to complete once a shutdown is
/// requested.
pub(crate) const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Owns the lifecycle of the listener: reports liveness at every interval
/// and stops the server once `shutdown` resolves.
///
/// It never touches the admission data path.
pub(crate) async fn supervise<F>(handle: Handle, liveness_interval: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(liveness_interval);
    // the first tick completes immediately
    ticker.tick().await;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("Admission controller server is running.");
            }
            _ = &mut shutdown => {
                info!("Received shutdown signal. Shutting down...");
                handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
                return;
            }
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
