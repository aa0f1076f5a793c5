// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of processed messages with pacing, retry and outcome recording.
//!
//! Each failed attempt appends one [`ErrorRecord`]. The terminal
//! [`PostRecord`] is written once: `posted` on success, `failed` after a
//! permanent rejection or when attempts run out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crosspost_core::error::{CrosspostError, DeliveryError};
use crosspost_core::redact::redact;
use crosspost_core::types::{
    ErrorRecord, InsertOutcome, PostRecord, PostStatus, ProcessedMessage, PublishRequest,
};
use crosspost_core::{PublishTarget, StorageAdapter};
use crosspost_resilience::{BackoffPolicy, PublishPacer};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How a publish run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Posted { post_id: String },
    /// Terminal failure, recorded as `failed`.
    Failed { error_type: &'static str },
    /// Shutdown interrupted the run before a terminal record was written.
    Interrupted,
}

/// Result of [`Publisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub outcome: PublishOutcome,
    /// Publish calls issued.
    pub attempts: u32,
    /// Backoff delays slept between attempts, in order.
    pub delays: Vec<Duration>,
}

/// Delivers processed messages to the target platform.
pub struct Publisher {
    target: Arc<dyn PublishTarget>,
    storage: Arc<dyn StorageAdapter>,
    backoff: BackoffPolicy,
    pacer: PublishPacer,
    secrets: Vec<String>,
}

impl Publisher {
    /// `secrets` are credential values scrubbed from persisted error text.
    pub fn new(
        target: Arc<dyn PublishTarget>,
        storage: Arc<dyn StorageAdapter>,
        backoff: BackoffPolicy,
        secrets: Vec<String>,
    ) -> Self {
        let pacer = PublishPacer::new(&target.limits());
        Self {
            target,
            storage,
            backoff,
            pacer,
            secrets,
        }
    }

    /// Publish `message`, retrying retryable failures, and record the outcome.
    ///
    /// Only storage failures are returned as errors; delivery failures end up
    /// in the report and the store.
    pub async fn publish(
        &self,
        message: &ProcessedMessage,
        cancel: &CancellationToken,
    ) -> Result<PublishReport, CrosspostError> {
        let id = message.raw.source_message_id.as_str();
        let request = PublishRequest {
            text: message.final_text.clone(),
            media: message.media.clone(),
        };
        let mut attempts = 0;
        let mut delays = Vec::new();

        loop {
            if cancel.is_cancelled() || !self.pacer.acquire(cancel).await {
                info!(source_message_id = id, attempts, "publish interrupted by shutdown");
                return Ok(PublishReport {
                    outcome: PublishOutcome::Interrupted,
                    attempts,
                    delays,
                });
            }

            attempts += 1;
            let err = match self.target.publish(&request).await {
                Ok(receipt) => {
                    let media_type = receipt.media_kind.map(|kind| kind.to_string());
                    self.record(
                        message,
                        PostStatus::Posted,
                        Some(receipt.post_id.clone()),
                        media_type,
                    )
                    .await?;
                    info!(
                        source_message_id = id,
                        post_id = %receipt.post_id,
                        attempts,
                        truncated = message.truncated,
                        "message posted"
                    );
                    return Ok(PublishReport {
                        outcome: PublishOutcome::Posted {
                            post_id: receipt.post_id,
                        },
                        attempts,
                        delays,
                    });
                }
                Err(err) => err,
            };

            self.log_attempt(id, &err).await;

            if !err.is_retryable() || !self.backoff.allows_retry(attempts) {
                error!(
                    source_message_id = id,
                    attempts,
                    error_type = err.error_type(),
                    error = %err,
                    "message delivery failed"
                );
                self.record(message, PostStatus::Failed, None, None).await?;
                return Ok(PublishReport {
                    outcome: PublishOutcome::Failed {
                        error_type: err.error_type(),
                    },
                    attempts,
                    delays,
                });
            }

            let delay = self.backoff.delay(attempts, err.retry_after());
            warn!(
                source_message_id = id,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error_type = err.error_type(),
                error = %err,
                "publish attempt failed, retrying"
            );
            delays.push(delay);

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(source_message_id = id, attempts, "retry abandoned by shutdown");
                    return Ok(PublishReport {
                        outcome: PublishOutcome::Interrupted,
                        attempts,
                        delays,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn log_attempt(&self, source_message_id: &str, err: &DeliveryError) {
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

    async fn record(
        &self,
        message: &ProcessedMessage,
        status: PostStatus,
        target_post_id: Option<String>,
        media_type: Option<String>,
    ) -> Result<(), CrosspostError> {
        let record = PostRecord {
            source_message_id: message.raw.source_message_id.clone(),
            target_post_id,
            channel_id: message.raw.channel_id.clone(),
            final_text: message.final_text.clone(),
            media_type,
            status,
            posted_at: Utc::now(),
        };
        if self.storage.record_post(&record).await? == InsertOutcome::AlreadyExists {
            warn!(
                source_message_id = %record.source_message_id,
                %status,
                "terminal record already present, keeping the first one"
            );
        }
        Ok(())
    }
}
