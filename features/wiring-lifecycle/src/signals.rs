//! Process signals as an external shutdown trigger.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::{controller::LifecycleController, errors::LifecycleError};

/// Wait for Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Spawns a task which closes the controller once a shutdown signal arrives
///
/// The task ends by itself when the registry is closed some other way first.
/// Must be called from within a tokio runtime.
pub fn spawn_signal_listener(controller: LifecycleController) -> JoinHandle<()> {
    spawn_shutdown_listener(controller, shutdown_signal())
}

/// Like [spawn_signal_listener], closing the controller once `trigger` completes
///
/// A trigger failing with an error does not close anything.
pub fn spawn_shutdown_listener(
    controller: LifecycleController,
    trigger: impl Future<Output = std::io::Result<()>> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            signal = trigger => {
                if let Err(e) = signal {
                    tracing::error!("Failed to listen for shutdown signals: {e}");
                    return;
                }

                tracing::info!("Shutdown signal received");
                // Closing blocks while teardown hooks run
                let closer = controller.clone();
                match tokio::task::spawn_blocking(move || closer.close_and_report()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(LifecycleError::NotStarted)) => {
                        tracing::warn!("Shutdown signal received before the registry was started");
                    }
                    Ok(Err(e)) => tracing::error!("Close after shutdown signal failed: {e}"),
                    Err(e) => tracing::error!("Close task failed: {e}"),
                }
            }
            _ = controller.closed() => {
                tracing::debug!("Registry closed, no longer listening for shutdown signals");
            }
        }
    })
}
