// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded FIFO buffer between the source monitor and the processor.
//!
//! The monitor is the single producer and the processor the single consumer.
//! Capacity is the only backpressure mechanism: a full queue suspends the
//! producer instead of dropping messages.

use crosspost_core::error::CrosspostError;
use crosspost_core::types::RawMessage;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded, in-memory ingest queue.
pub struct IngestQueue {
    tx: mpsc::Sender<RawMessage>,
    rx: Mutex<mpsc::Receiver<RawMessage>>,
    capacity: usize,
    closed: CancellationToken,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
            closed: CancellationToken::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Enqueue a message, waiting for room when the queue is full.
    ///
    /// Fails once the queue is closed. The caller owns reporting the loss.
    pub async fn push(&self, message: RawMessage) -> Result<(), CrosspostError> {
        if self.closed.is_cancelled() {
            return Err(rejected(&message));
        }

        let message = match self.tx.try_send(message) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Closed(message)) => return Err(rejected(&message)),
            Err(TrySendError::Full(message)) => message,
        };

        warn!(
            source_message_id = %message.source_message_id,
            capacity = self.capacity,
            "ingest queue full, waiting for the processor"
        );
        let id = message.source_message_id.clone();
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(CrosspostError::Internal(format!(
                "ingest queue closed while message {id} waited for room"
            ))),
            sent = self.tx.send(message) => sent.map_err(|e| rejected(&e.0)),
        }
    }

    /// Remove up to `max` items that are available right now, in arrival order.
    pub async fn drain(&self, max: usize) -> Vec<RawMessage> {
        let mut rx = self.rx.lock().await;
        let mut batch = Vec::with_capacity(max.min(self.capacity));
        while batch.len() < max {
            match rx.try_recv() {
                Ok(message) => batch.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if !batch.is_empty() {
            debug!(count = batch.len(), "drained ingest queue");
        }
        batch
    }

    /// Stop accepting new items. Buffered items stay drainable.
    pub async fn close(&self) {
        self.closed.cancel();
        self.rx.lock().await.close();
    }
}

fn rejected(message: &RawMessage) -> CrosspostError {
    CrosspostError::Internal(format!(
        "ingest queue closed, message {} not accepted",
        message.source_message_id
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;

    fn msg(id: &str) -> RawMessage {
        RawMessage {
            source_message_id: id.to_string(),
            channel_id: "-100".to_string(),
            text: format!("message {id}"),
            media: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn drains_in_arrival_order() {
        let queue = IngestQueue::new(10);
        for id in ["1", "2", "3"] {
            queue.push(msg(id)).await.unwrap();
        }
        assert_eq!(queue.len(), 3);

        let ids: Vec<_> = queue
            .drain(10)
            .await
            .into_iter()
            .map(|m| m.source_message_id)
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn drain_takes_at_most_max() {
        let queue = IngestQueue::new(10);
        for id in ["1", "2", "3"] {
            queue.push(msg(id)).await.unwrap();
        }
        assert_eq!(queue.drain(2).await.len(), 2);
        assert_eq!(queue.drain(2).await.len(), 1);
        assert!(queue.drain(2).await.is_empty());
    }

    #[tokio::test]
    async fn full_queue_blocks_the_producer() {
        let queue = Arc::new(IngestQueue::new(1));
        queue.push(msg("1")).await.unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(msg("2")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.drain(1).await[0].source_message_id, "1");
        producer.await.unwrap().unwrap();
        assert_eq!(queue.drain(1).await[0].source_message_id, "2");
    }

    #[tokio::test]
    async fn close_rejects_new_items_but_keeps_buffered_ones() {
        let queue = IngestQueue::new(4);
        queue.push(msg("1")).await.unwrap();
        queue.close().await;

        assert!(queue.is_closed());
        assert!(queue.push(msg("2")).await.is_err());
        assert_eq!(queue.drain(4).await.len(), 1);
    }

    #[tokio::test]
    async fn close_releases_a_blocked_producer() {
        let queue = Arc::new(IngestQueue::new(1));
        queue.push(msg("1")).await.unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(msg("2")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close().await;

        assert!(producer.await.unwrap().is_err());
    }
}
