// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use crosspost_config::model::StorageConfig;
use crosspost_core::types::{CleanupReport, DailyStats, ErrorRecord, InsertOutcome, PostRecord};
use crosspost_core::{AdapterType, CrosspostError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed persistence store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, CrosspostError> {
        self.db
            .get()
            .ok_or_else(|| CrosspostError::storage_msg("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CrosspostError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CrosspostError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), CrosspostError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| CrosspostError::storage_msg("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CrosspostError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn find_post(&self, source_message_id: &str) -> Result<Option<PostRecord>, CrosspostError> {
        queries::posts::find_post(self.db()?, source_message_id).await
    }

    async fn record_post(&self, record: &PostRecord) -> Result<InsertOutcome, CrosspostError> {
        queries::posts::insert_post(self.db()?, record).await
    }

    async fn log_error(&self, record: &ErrorRecord) -> Result<(), CrosspostError> {
        queries::errors::insert_error(self.db()?, record).await
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<PostRecord>, CrosspostError> {
        queries::posts::recent_posts(self.db()?, limit).await
    }

    async fn recent_errors(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ErrorRecord>, CrosspostError> {
        queries::errors::recent_errors(self.db()?, since, limit).await
    }

    async fn error_count(&self, since: DateTime<Utc>) -> Result<i64, CrosspostError> {
        queries::errors::count_errors(self.db()?, since).await
    }

    async fn cleanup(&self, cutoff: DateTime<Utc>) -> Result<CleanupReport, CrosspostError> {
        queries::cleanup::delete_older_than(self.db()?, cutoff).await
    }

    async fn daily_stats(&self) -> Result<Vec<DailyStats>, CrosspostError> {
        queries::stats::daily_stats(self.db()?).await
    }
}
