//! OS signal handling: cancel the running race and exit.

use tracing::{info, warn};

use crate::query::CancelToken;

/// On SIGINT, SIGTERM or SIGHUP, cancel `cancel` and exit the process.
pub fn cancel_on_signal(cancel: CancelToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
        info!("Canceling query");
        std::process::exit(0);
    });
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut term), Ok(mut hup)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) else {
        warn!("Failed to install SIGTERM/SIGHUP handlers, listening for Ctrl-C only");
        ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = term.recv() => {}
        _ = hup.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await;
}
