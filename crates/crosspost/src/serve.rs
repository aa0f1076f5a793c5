// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `crosspost serve` command implementation.
//!
//! Builds the Telegram source, the X target and the SQLite store, verifies
//! the X credentials, and runs the bridge until a shutdown signal arrives.

use std::sync::Arc;

use crosspost_bridge::{BridgeController, install_signal_handler};
use crosspost_config::model::CrosspostConfig;
use crosspost_core::error::{CrosspostError, DeliveryError, PermanentKind};
use crosspost_core::types::HealthStatus;
use crosspost_core::{PublishTarget, StorageAdapter};
use crosspost_storage::SqliteStorage;
use crosspost_telegram::TelegramSource;
use crosspost_twitter::TwitterPublisher;
use tracing::{error, info, warn};

/// Run the bridge. Returns an error on unrecoverable startup failure.
pub async fn run_serve(config: CrosspostConfig) -> Result<(), CrosspostError> {
    init_tracing(&config.app.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting crosspost");
    for warning in crosspost_config::config_warnings(&config) {
        warn!("{warning}");
    }

    let source = TelegramSource::new(&config.telegram)?;
    let target = TwitterPublisher::new(&config.twitter)?;
    verify_target(&target).await?;

    let storage: Arc<dyn StorageAdapter> = Arc::new(SqliteStorage::new(config.storage.clone()));
    let cancel = install_signal_handler();

    match BridgeController::new(config, Box::new(source), Arc::new(target), storage)
        .run(cancel)
        .await
    {
        Ok(summary) => {
            info!(abandoned = summary.abandoned, "crosspost stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, error_type = e.error_type(), "crosspost stopped with an error");
            Err(e)
        }
    }
}

/// Fail fast when the target rejects our credentials.
async fn verify_target(target: &dyn PublishTarget) -> Result<(), CrosspostError> {
    match target.health_check().await? {
        HealthStatus::Healthy => {
            info!(adapter = target.name(), "target credentials verified");
            Ok(())
        }
        HealthStatus::Degraded(reason) => {
            warn!(adapter = target.name(), %reason, "target check inconclusive, continuing");
            Ok(())
        }
        HealthStatus::Unhealthy(reason) => Err(DeliveryError::Permanent {
            kind: PermanentKind::Auth,
            message: reason,
        }
        .into()),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crosspost={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
