// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persistence store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CrosspostError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CleanupReport, DailyStats, ErrorRecord, InsertOutcome, PostRecord};

/// Adapter for the durable record of posted, failed and skipped messages.
///
/// The store is the sole source of deduplication truth: a second
/// [`record_post`](StorageAdapter::record_post) for the same source message id
/// reports [`InsertOutcome::AlreadyExists`] and leaves the first record intact.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), CrosspostError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), CrosspostError>;

    /// Looks up the terminal record for a source message.
    async fn find_post(&self, source_message_id: &str)
    -> Result<Option<PostRecord>, CrosspostError>;

    /// Inserts a terminal record unless one already exists for the same id.
    async fn record_post(&self, record: &PostRecord) -> Result<InsertOutcome, CrosspostError>;

    /// Appends a diagnostic entry.
    async fn log_error(&self, record: &ErrorRecord) -> Result<(), CrosspostError>;

    /// Most recent terminal records, newest first.
    async fn recent_posts(&self, limit: u32) -> Result<Vec<PostRecord>, CrosspostError>;

    /// Error entries newer than `since`, newest first.
    async fn recent_errors(
        &self,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ErrorRecord>, CrosspostError>;

    /// Number of error entries newer than `since`.
    async fn error_count(&self, since: DateTime<Utc>) -> Result<i64, CrosspostError>;

    /// Deletes post and error records older than `cutoff`.
    async fn cleanup(&self, cutoff: DateTime<Utc>) -> Result<CleanupReport, CrosspostError>;

    /// Reads the derived per-day statistics view, newest day first.
    async fn daily_stats(&self) -> Result<Vec<DailyStats>, CrosspostError>;
}
