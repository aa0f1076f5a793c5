// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` owns a temp SQLite store and a configuration tuned for
//! tests: millisecond backoff without jitter, one-second cadences and dummy
//! credentials.

use std::sync::Arc;

use chrono::Utc;
use crosspost_config::model::{CrosspostConfig, StorageConfig};
use crosspost_core::types::RawMessage;
use crosspost_core::{CrosspostError, StorageAdapter};
use crosspost_storage::SqliteStorage;

/// Channel id used by [`raw_message`].
pub const TEST_CHANNEL_ID: &str = "-1001234567890";

/// Build a text-only raw message from the test channel.
pub fn raw_message(id: &str, text: &str) -> RawMessage {
    RawMessage {
        source_message_id: id.to_string(),
        channel_id: TEST_CHANNEL_ID.to_string(),
        text: text.to_string(),
        media: vec![],
        created_at: Utc::now(),
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: CrosspostConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = CrosspostConfig::default();
        config.telegram.bot_token = Some("123456789:test-token".to_string());
        config.telegram.channel = Some("@crosspost_test".to_string());
        config.twitter.api_key = Some("test-api-key".to_string());
        config.twitter.api_secret = Some("test-api-secret".to_string());
        config.twitter.access_token = Some("test-access-token".to_string());
        config.twitter.access_token_secret = Some("test-access-secret".to_string());
        config.twitter.min_post_interval_secs = 0;
        config.retry.base_delay_ms = 10;
        config.retry.max_delay_ms = 1_000;
        config.retry.jitter_ratio = 0.0;
        config.bridge.process_interval_secs = 1;
        config.bridge.shutdown_timeout_secs = 5;
        Self { config }
    }

    /// Adjust the configuration before the harness is built.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut CrosspostConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Build the harness: create the temp directory and initialize the store.
    pub async fn build(self) -> Result<TestHarness, CrosspostError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| CrosspostError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            storage: Arc::new(storage),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp store plus configuration, removed on drop.
pub struct TestHarness {
    /// Initialized SQLite storage on the temp database.
    pub storage: Arc<SqliteStorage>,
    /// Test-tuned configuration pointing at the temp database.
    pub config: CrosspostConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with the default test configuration.
    pub async fn new() -> Result<Self, CrosspostError> {
        Self::builder().build().await
    }

    /// The shared store as a trait object.
    pub fn store(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }

    /// A second, uninitialized adapter on the same database file, for
    /// components that open the store themselves.
    pub fn fresh_storage(&self) -> SqliteStorage {
        SqliteStorage::new(self.config.storage.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_store_is_ready() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.storage.find_post("missing").await.unwrap().is_none());
        assert!(harness.config.storage.database_path.ends_with("test.db"));
    }

    #[tokio::test]
    async fn with_config_applies_adjustments() {
        let harness = TestHarness::builder()
            .with_config(|c| c.bridge.queue_capacity = 3)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.bridge.queue_capacity, 3);
    }
}
