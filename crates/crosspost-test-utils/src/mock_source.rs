// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel source for deterministic testing.
//!
//! `MockSource` implements `SourceAdapter` with injectable messages, scripted
//! receive and media failures, and lifecycle flags for assertions. Clones
//! share state, so a test keeps one handle while the bridge owns another.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crosspost_core::CrosspostError;
use crosspost_core::traits::adapter::PluginAdapter;
use crosspost_core::traits::source::SourceAdapter;
use crosspost_core::types::{AdapterType, HealthStatus, MediaRef, RawMessage, ResolvedMedia};

/// A mock channel source for testing.
#[derive(Clone, Default)]
pub struct MockSource {
    inbound: Arc<Mutex<VecDeque<RawMessage>>>,
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
    receive_failures: Arc<AtomicUsize>,
    broken_media: Arc<Mutex<HashMap<String, String>>>,
    connect_error: Option<String>,
    connected: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose `connect()` fails with the given message.
    pub fn failing_connect(message: &str) -> Self {
        Self {
            connect_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Queue a message for the next `receive()`.
    pub async fn inject_message(&self, msg: RawMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// End the event stream. `receive()` returns `None` once drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make the next `n` calls to `receive()` fail.
    pub fn fail_next_receives(&self, n: usize) {
        self.receive_failures.store(n, Ordering::SeqCst);
    }

    /// Make `resolve_media` fail for the given file id.
    pub async fn break_media(&self, file_id: &str, message: &str) {
        self.broken_media
            .lock()
            .await
            .insert(file_id.to_string(), message.to_string());
    }

    /// Messages injected but not yet received.
    pub async fn pending(&self) -> usize {
        self.inbound.lock().await.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, CrosspostError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CrosspostError> {
        self.shut_down.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    async fn connect(&mut self) -> Result<(), CrosspostError> {
        if let Some(message) = &self.connect_error {
            return Err(CrosspostError::SourceConnection {
                message: message.clone(),
                source: None,
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<RawMessage>, CrosspostError> {
        loop {
            let failing = self
                .receive_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(CrosspostError::SourceConnection {
                    message: "mock receive failure".to_string(),
                    source: None,
                });
            }

            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(Some(msg));
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.notify.notified().await;
        }
    }

    async fn resolve_media(&self, media: &MediaRef) -> Result<ResolvedMedia, CrosspostError> {
        if let Some(message) = self.broken_media.lock().await.get(&media.file_id) {
            return Err(CrosspostError::SourceConnection {
                message: message.clone(),
                source: None,
            });
        }
        Ok(ResolvedMedia {
            kind: media.kind,
            mime_type: media
                .mime_type
                .clone()
                .unwrap_or_else(|| "image/jpeg".to_string()),
            data: media.file_id.as_bytes().to_vec(),
        })
    }
}
