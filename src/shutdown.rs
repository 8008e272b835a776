use crate::components::ComponentManager;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Wait for a termination signal, drain components, then notify the server
pub async fn handle_signals(
    shutdown_send: oneshot::Sender<()>,
    component_manager: Arc<ComponentManager>,
) {
    // Wait for a termination signal
    wait_for_signal().await;

    // Shut down all components
    if let Err(e) = component_manager.shutdown_all().await {
        error!("Error shutting down components: {:?}", e);
    } else {
        info!("All components shut down successfully");
    }

    // Send shutdown signal to the server task
    let _ = shutdown_send.send(());
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to create SIGTERM signal handler");
    let mut sigint =
        signal(SignalKind::interrupt()).expect("Failed to create SIGINT signal handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
}

/// Platform-specific signal handling implementation
#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C signal, initiating graceful shutdown");
    }
}
