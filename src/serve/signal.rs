use std::time::Duration;

use tokio::{task::JoinSet, time::timeout};
use tracing::{info, warn};

/// Resolves once Ctrl+C (or SIGTERM on unix) is received.
pub(super) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C signal handle error: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(target_family = "unix")]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("SIGTERM signal handle error: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(target_family = "unix"))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received: starting graceful shutdown");
}

/// Waits up to `grace` for open relays to finish, then aborts the rest.
pub(super) async fn graceful_shutdown(mut connections: JoinSet<()>, grace: Duration) {
    let drained = timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        info!("Alive connections: {}", connections.len());
        connections.shutdown().await;
    }
}
