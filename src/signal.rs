use {super::*, tokio::signal::ctrl_c};

/// Cancels the returned token on the first SIGINT or SIGTERM, which is the
/// cooperative stop signal for the switcher, the session, and every worker.
pub(crate) fn setup_handler() -> CancellationToken {
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown requested, stopping miners");
        token.cancel();
    });

    cancel
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {e}");
            ctrl_c().await.ok();
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await.ok();
}
