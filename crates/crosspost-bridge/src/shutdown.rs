// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process signals mapped onto the bridge's cancellation token.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawns a task that cancels the returned token on SIGINT or SIGTERM.
///
/// The controller treats cancellation as a shutdown request: the queue stops
/// accepting items and the in-flight tick gets its grace period.
pub fn install_signal_handler() -> CancellationToken {
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                info!(signal, "shutdown signal received, stopping bridge");
                trigger.cancel();
            }
            _ = trigger.cancelled() => {}
        }
    });

    shutdown
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only Ctrl+C will stop the bridge");
            return interrupt().await;
        }
    };
    tokio::select! {
        name = interrupt() => name,
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    interrupt().await
}

async fn interrupt() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
