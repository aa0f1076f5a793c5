// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge lifecycle: startup, processing and cleanup cadences, shutdown.
//!
//! The controller owns the store and the queue. Startup opens the store and
//! connects the source (either failure is fatal). Three tasks then run until
//! shutdown: the source monitor feeding the queue, the processing cadence,
//! and the slower retention cleanup cadence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crosspost_config::model::{BridgeConfig, CrosspostConfig};
use crosspost_core::error::CrosspostError;
use crosspost_core::types::CleanupReport;
use crosspost_core::{PublishTarget, SourceAdapter, StorageAdapter};
use crosspost_resilience::BackoffPolicy;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::filter::SpamFilter;
use crate::processor::MessageProcessor;
use crate::publisher::Publisher;
use crate::queue::IngestQueue;
use crate::transform::Transformer;

/// Reconnect delays for a source whose event stream errors mid-run.
const RECONNECT_BASE: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(60);

/// Why the monitor task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorExit {
    Cancelled,
    SourceClosed,
    QueueClosed,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Queued messages dropped at shutdown.
    pub abandoned: usize,
}

/// Output of one retention cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub cutoff: DateTime<Utc>,
    pub deleted: CleanupReport,
    pub posts_total: i64,
    pub recent_errors: i64,
}

/// Wires the source, queue, processor, publisher and store together.
pub struct BridgeController {
    config: CrosspostConfig,
    source: Box<dyn SourceAdapter>,
    target: Arc<dyn PublishTarget>,
    storage: Arc<dyn StorageAdapter>,
}

impl BridgeController {
    pub fn new(
        config: CrosspostConfig,
        source: Box<dyn SourceAdapter>,
        target: Arc<dyn PublishTarget>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        Self {
            config,
            source,
            target,
            storage,
        }
    }

    /// Run until `cancel` fires or the source stream ends for good.
    ///
    /// Errors during startup are returned before any task is spawned. A
    /// source that disappears mid-run shuts the bridge down and is reported
    /// as an error.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunSummary, CrosspostError> {
        let BridgeController {
            config,
            mut source,
            target,
            storage,
        } = self;
        let bridge = config.bridge.clone();

        storage.initialize().await?;
        info!(adapter = storage.name(), "persistence store opened");

        if let Err(e) = source.connect().await {
            error!(error = %e, "source connection failed");
            close_storage(storage.as_ref()).await;
            return Err(e);
        }
        info!(adapter = source.name(), "source monitor connected");

        let source: Arc<dyn SourceAdapter> = Arc::from(source);
        let queue = Arc::new(IngestQueue::new(bridge.queue_capacity));
        let processor = match build_processor(&config, &queue, &source, &target, &storage) {
            Ok(processor) => Arc::new(processor),
            Err(e) => {
                shutdown_source(source.as_ref()).await;
                close_storage(storage.as_ref()).await;
                return Err(e);
            }
        };

        let mut monitor = tokio::spawn(run_monitor(
            Arc::clone(&source),
            Arc::clone(&queue),
            cancel.clone(),
        ));
        let mut processing = tokio::spawn(run_processing(
            Arc::clone(&processor),
            Duration::from_secs(bridge.process_interval_secs),
            cancel.clone(),
        ));
        let cleanup = tokio::spawn(run_cleanup(
            Arc::clone(&storage),
            bridge.clone(),
            cancel.clone(),
        ));
        info!(
            queue_capacity = bridge.queue_capacity,
            batch_size = bridge.batch_size,
            process_interval_secs = bridge.process_interval_secs,
            cleanup_interval_hours = bridge.cleanup_interval_hours,
            "bridge running"
        );

        let mut failure = None;
        let mut processing_done = false;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("shutdown requested");
            }
            exit = &mut monitor => match exit {
                Ok(MonitorExit::Cancelled) => info!("shutdown requested"),
                Ok(MonitorExit::SourceClosed) => {
                    error!("source event stream ended, shutting down");
                    failure = Some(CrosspostError::SourceConnection {
                        message: "source event stream ended".to_string(),
                        source: None,
                    });
                }
                other => {
                    error!(exit = ?other, "source monitor stopped unexpectedly, shutting down");
                    failure = Some(CrosspostError::Internal("source monitor stopped".into()));
                }
            },
            joined = &mut processing => {
                processing_done = true;
                error!(?joined, "processing loop stopped unexpectedly, shutting down");
                failure = Some(CrosspostError::Internal("processing loop stopped".into()));
            }
        }
        cancel.cancel();

        // Stop accepting new items, then give the in-flight tick its grace period.
        queue.close().await;
        let grace = Duration::from_secs(bridge.shutdown_timeout_secs);
        if !processing_done {
            await_task("processing", processing, grace).await;
        }
        await_task("cleanup", cleanup, grace).await;
        if !monitor.is_finished() {
            monitor.abort();
        }

        let abandoned = queue.drain(usize::MAX).await;
        if !abandoned.is_empty() {
            let ids: Vec<&str> = abandoned
                .iter()
                .map(|m| m.source_message_id.as_str())
                .collect();
            warn!(
                count = abandoned.len(),
                source_message_ids = ?ids,
                "abandoning queued messages at shutdown"
            );
        }

        shutdown_source(source.as_ref()).await;
        close_storage(storage.as_ref()).await;
        info!("bridge stopped");

        match failure {
            Some(e) => Err(e),
            None => Ok(RunSummary {
                abandoned: abandoned.len(),
            }),
        }
    }
}

fn build_processor(
    config: &CrosspostConfig,
    queue: &Arc<IngestQueue>,
    source: &Arc<dyn SourceAdapter>,
    target: &Arc<dyn PublishTarget>,
    storage: &Arc<dyn StorageAdapter>,
) -> Result<MessageProcessor, CrosspostError> {
    let secrets = known_secrets(config);
    let filter = SpamFilter::new(config.filter.clone())?;
    let transformer = Transformer::new(&config.transform, target.limits().max_text_length);
    let publisher = Publisher::new(
        Arc::clone(target),
        Arc::clone(storage),
        BackoffPolicy::from_config(&config.retry),
        secrets.clone(),
    );
    Ok(MessageProcessor::new(
        Arc::clone(queue),
        Arc::clone(source),
        Arc::clone(storage),
        filter,
        transformer,
        publisher,
        config.bridge.batch_size,
        config.bridge.publish_media,
        secrets,
    ))
}

/// Credential values scrubbed from persisted error messages.
pub fn known_secrets(config: &CrosspostConfig) -> Vec<String> {
    let mut secrets = config.twitter.secrets();
    secrets.extend(config.telegram.bot_token.clone());
    secrets
}

/// Move source messages onto the queue until cancelled or the stream ends.
async fn run_monitor(
    source: Arc<dyn SourceAdapter>,
    queue: Arc<IngestQueue>,
    cancel: CancellationToken,
) -> MonitorExit {
    let reconnect = BackoffPolicy::new(RECONNECT_BASE, RECONNECT_MAX, 0.2, u32::MAX);
    let mut failures = 0u32;

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => return MonitorExit::Cancelled,
            received = source.receive() => received,
        };

        let message = match received {
            Ok(Some(message)) => {
                failures = 0;
                message
            }
            Ok(None) => return MonitorExit::SourceClosed,
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = reconnect.delay(failures, None);
                warn!(
                    error = %e,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "source receive failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return MonitorExit::Cancelled,
                    _ = tokio::time::sleep(delay) => continue,
                }
            }
        };

        let id = message.source_message_id.clone();
        debug!(source_message_id = %id, "message received");
        if let Err(e) = queue.push(message).await {
            warn!(source_message_id = %id, error = %e, "message dropped, queue closed");
            return MonitorExit::QueueClosed;
        }
    }
}

/// Fixed-cadence processing loop.
async fn run_processing(
    processor: Arc<MessageProcessor>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("processing loop stopped");
                return;
            }
            _ = interval.tick() => {
                processor.run_tick(&cancel).await;
            }
        }
    }
}

/// Retention cleanup loop. The first run happens one interval after startup.
async fn run_cleanup(
    storage: Arc<dyn StorageAdapter>,
    config: BridgeConfig,
    cancel: CancellationToken,
) {
    let every = Duration::from_secs(config.cleanup_interval_hours.saturating_mul(3600).max(1));
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the first immediate tick.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("cleanup loop stopped");
                return;
            }
            _ = interval.tick() => {
                if let Err(e) = run_maintenance(storage.as_ref(), &config, Utc::now()).await {
                    error!(error = %e, "retention cleanup failed");
                }
            }
        }
    }
}

/// Delete records older than the retention window and log aggregate statistics.
pub async fn run_maintenance(
    storage: &dyn StorageAdapter,
    config: &BridgeConfig,
    now: DateTime<Utc>,
) -> Result<MaintenanceReport, CrosspostError> {
    let cutoff = now - chrono::Duration::days(i64::from(config.retention_days));
    let deleted = storage.cleanup(cutoff).await?;
    info!(
        %cutoff,
        posts_deleted = deleted.posts_deleted,
        errors_deleted = deleted.errors_deleted,
        "retention cleanup complete"
    );

    let window_start = now - chrono::Duration::hours(i64::from(config.stats_error_window_hours));
    let recent_errors = storage.error_count(window_start).await?;
    let stats = storage.daily_stats().await?;
    let posts_total: i64 = stats.iter().map(|d| d.post_count).sum();
    info!(
        days = stats.len(),
        posts_total,
        recent_errors,
        window_hours = config.stats_error_window_hours,
        "bridge statistics"
    );
    for day in stats.iter().take(7) {
        debug!(
            day = %day.day,
            posts = day.post_count,
            channels = day.channel_count,
            with_media = day.media_count,
            "daily statistics"
        );
    }

    Ok(MaintenanceReport {
        cutoff,
        deleted,
        posts_total,
        recent_errors,
    })
}

async fn await_task(name: &str, mut handle: JoinHandle<()>, grace: Duration) {
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(())) => debug!(task = name, "task finished"),
        Ok(Err(e)) => error!(task = name, error = %e, "task failed"),
        Err(_) => {
            warn!(
                task = name,
                grace_secs = grace.as_secs(),
                "task did not finish within the shutdown timeout, aborting"
            );
            handle.abort();
        }
    }
}

async fn shutdown_source(source: &dyn SourceAdapter) {
    if let Err(e) = source.shutdown().await {
        warn!(error = %e, "source shutdown failed");
    }
}

async fn close_storage(storage: &dyn StorageAdapter) {
    if let Err(e) = storage.close().await {
        error!(error = %e, "failed to close persistence store");
    }
}
