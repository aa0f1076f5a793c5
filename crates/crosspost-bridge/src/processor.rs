// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tick message processing: dedup, filter, transform, publish.
//!
//! Items are handled one at a time in arrival order. A failure on one item
//! is logged and recorded, then processing moves on to the next.

use std::sync::Arc;

use chrono::Utc;
use crosspost_core::error::CrosspostError;
use crosspost_core::redact::redact;
use crosspost_core::types::{
    ErrorRecord, InsertOutcome, PostRecord, PostStatus, ProcessedMessage, RawMessage,
    ResolvedMedia,
};
use crosspost_core::{SourceAdapter, StorageAdapter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::filter::{FilterReason, SpamFilter};
use crate::publisher::{PublishOutcome, Publisher};
use crate::queue::IngestQueue;
use crate::transform::{Transformer, clean_markup};

/// Terminal decision for one drained message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A terminal record already existed; nothing was written.
    Duplicate,
    Skipped(FilterReason),
    Published(PublishOutcome),
}

/// Counters for one processing tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub drained: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub posted: usize,
    pub failed: usize,
    /// Items whose processing raised a storage or internal error.
    pub errored: usize,
    /// Items left unprocessed because shutdown was requested.
    pub interrupted: usize,
}

impl TickSummary {
    fn count(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Duplicate => self.duplicates += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Published(PublishOutcome::Posted { .. }) => self.posted += 1,
            ItemOutcome::Published(PublishOutcome::Failed { .. }) => self.failed += 1,
            ItemOutcome::Published(PublishOutcome::Interrupted) => self.interrupted += 1,
        }
    }
}

/// Turns queued raw messages into terminal decisions.
pub struct MessageProcessor {
    queue: Arc<IngestQueue>,
    source: Arc<dyn SourceAdapter>,
    storage: Arc<dyn StorageAdapter>,
    filter: SpamFilter,
    transformer: Transformer,
    publisher: Publisher,
    batch_size: usize,
    publish_media: bool,
    secrets: Vec<String>,
}

impl MessageProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<IngestQueue>,
        source: Arc<dyn SourceAdapter>,
        storage: Arc<dyn StorageAdapter>,
        filter: SpamFilter,
        transformer: Transformer,
        publisher: Publisher,
        batch_size: usize,
        publish_media: bool,
        secrets: Vec<String>,
    ) -> Self {
        Self {
            queue,
            source,
            storage,
            filter,
            transformer,
            publisher,
            batch_size: batch_size.max(1),
            publish_media,
            secrets,
        }
    }

    /// Drain what is available right now and process it.
    pub async fn run_tick(&self, cancel: &CancellationToken) -> TickSummary {
        let mut summary = TickSummary::default();
        if cancel.is_cancelled() {
            return summary;
        }

        let batch = self.queue.drain(self.batch_size).await;
        summary.drained = batch.len();

        let mut batch = batch.into_iter();
        while let Some(raw) = batch.next() {
            if cancel.is_cancelled() {
                let abandoned: Vec<String> = std::iter::once(raw)
                    .chain(batch.by_ref())
                    .map(|m| m.source_message_id)
                    .collect();
                warn!(
                    count = abandoned.len(),
                    source_message_ids = ?abandoned,
                    "shutdown requested, abandoning rest of the batch"
                );
                summary.interrupted += abandoned.len();
                break;
            }

            let id = raw.source_message_id.clone();
            match self.process(raw, cancel).await {
                Ok(outcome) => summary.count(&outcome),
                Err(e) => {
                    summary.errored += 1;
                    error!(source_message_id = %id, error = %e, "message processing failed");
                    self.log_item_error(&id, &e).await;
                }
            }
        }

        if summary.drained > 0 {
            info!(
                drained = summary.drained,
                posted = summary.posted,
                skipped = summary.skipped,
                duplicates = summary.duplicates,
                failed = summary.failed,
                errored = summary.errored,
                interrupted = summary.interrupted,
                "processing tick complete"
            );
        }
        summary
    }

    /// Carry one message to its terminal decision.
    pub async fn process(
        &self,
        raw: RawMessage,
        cancel: &CancellationToken,
    ) -> Result<ItemOutcome, CrosspostError> {
        let id = raw.source_message_id.clone();

        if let Some(existing) = self.storage.find_post(&id).await? {
            info!(
                source_message_id = %id,
                status = %existing.status,
                "duplicate message, already handled"
            );
            return Ok(ItemOutcome::Duplicate);
        }

        let cleaned = clean_markup(&raw.text);
        if let Err(reason) = self.filter.check(&raw.text, &cleaned, !raw.media.is_empty()) {
            return self.skip(&raw, cleaned, reason).await;
        }

        let transformed = self.transformer.apply(&cleaned);
        if transformed.truncated {
            debug!(
                source_message_id = %id,
                original_len = cleaned.chars().count(),
                max_len = self.transformer.max_len(),
                "text truncated"
            );
        }

        let media = self.resolve_media(&raw, cancel).await;
        let message = ProcessedMessage {
            raw,
            cleaned_text: cleaned,
            final_text: transformed.final_text,
            added_tags: transformed.added_tags,
            truncated: transformed.truncated,
            media,
        };

        let report = self.publisher.publish(&message, cancel).await?;
        Ok(ItemOutcome::Published(report.outcome))
    }

    async fn skip(
        &self,
        raw: &RawMessage,
        cleaned: String,
        reason: FilterReason,
    ) -> Result<ItemOutcome, CrosspostError> {
        let record = PostRecord {
            source_message_id: raw.source_message_id.clone(),
            target_post_id: None,
            channel_id: raw.channel_id.clone(),
            final_text: cleaned,
            media_type: None,
            status: PostStatus::Skipped,
            posted_at: Utc::now(),
        };
        if self.storage.record_post(&record).await? == InsertOutcome::AlreadyExists {
            info!(
                source_message_id = %raw.source_message_id,
                "duplicate message, recorded concurrently"
            );
            return Ok(ItemOutcome::Duplicate);
        }
        info!(
            source_message_id = %raw.source_message_id,
            reason = reason.label(),
            detail = %reason,
            "message filtered"
        );
        Ok(ItemOutcome::Skipped(reason))
    }

    /// Fetch attachments. Failures drop the attachment, not the message.
    async fn resolve_media(
        &self,
        raw: &RawMessage,
        cancel: &CancellationToken,
    ) -> Vec<ResolvedMedia> {
        if !self.publish_media || raw.media.is_empty() {
            return Vec::new();
        }
        let mut resolved = Vec::with_capacity(raw.media.len());
        for media in &raw.media {
            if cancel.is_cancelled() {
                break;
            }
            match self.source.resolve_media(media).await {
                Ok(content) => resolved.push(content),
                Err(e) => warn!(
                    source_message_id = %raw.source_message_id,
                    file_id = %media.file_id,
                    kind = %media.kind,
                    error = %e,
                    "media could not be fetched, publishing without it"
                ),
            }
        }
        resolved
    }

    async fn log_item_error(&self, source_message_id: &str, err: &CrosspostError) {
        let record = ErrorRecord {
            source_message_id: Some(source_message_id.to_string()),
            error_type: err.error_type().to_string(),
            message: redact(&err.to_string(), &self.secrets),
            occurred_at: Utc::now(),
        };
        if let Err(e) = self.storage.log_error(&record).await {
            error!(source_message_id, error = %e, "failed to write error record");
        }
    }
}
