// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock publish target for deterministic testing.
//!
//! Outcomes are popped from a FIFO script. When the script is empty every
//! call succeeds with a generated post id. All requests are captured.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crosspost_core::error::{CrosspostError, DeliveryError, PermanentKind};
use crosspost_core::traits::adapter::PluginAdapter;
use crosspost_core::traits::target::PublishTarget;
use crosspost_core::types::{
    AdapterType, HealthStatus, PublishReceipt, PublishRequest, TargetLimits,
};

/// A mock target that returns scripted outcomes.
#[derive(Clone)]
pub struct MockTarget {
    script: Arc<Mutex<VecDeque<Result<PublishReceipt, DeliveryError>>>>,
    requests: Arc<Mutex<Vec<PublishRequest>>>,
    next_id: Arc<AtomicU64>,
    limits: TargetLimits,
}

impl MockTarget {
    /// A target with a 280 character limit and no pacing.
    pub fn new() -> Self {
        Self::with_limits(TargetLimits {
            max_text_length: 280,
            min_interval: Duration::ZERO,
            posts_per_window: u32::MAX,
            window: Duration::from_secs(86_400),
        })
    }

    pub fn with_limits(limits: TargetLimits) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            limits,
        }
    }

    /// Append an outcome for a future call.
    pub async fn push_outcome(&self, outcome: Result<PublishReceipt, DeliveryError>) {
        self.script.lock().await.push_back(outcome);
    }

    /// Script `n` consecutive failures with the same error.
    pub async fn fail_times(&self, n: usize, error: DeliveryError) {
        let mut script = self.script.lock().await;
        for _ in 0..n {
            script.push_back(Err(error.clone()));
        }
    }

    /// Number of publish calls received.
    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// All requests received, in call order.
    pub async fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().await.clone()
    }

    pub fn rate_limited(retry_after: Option<Duration>) -> DeliveryError {
        DeliveryError::RateLimited {
            retry_after,
            message: "HTTP 429: Too Many Requests".to_string(),
        }
    }

    pub fn transient() -> DeliveryError {
        DeliveryError::Transient {
            message: "HTTP 503: Service Unavailable".to_string(),
        }
    }

    pub fn auth_failure() -> DeliveryError {
        DeliveryError::Permanent {
            kind: PermanentKind::Auth,
            message: "HTTP 401: Unauthorized".to_string(),
        }
    }
}

impl Default for MockTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTarget {
    fn name(&self) -> &str {
        "mock-target"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Target
    }

    async fn health_check(&self) -> Result<HealthStatus, CrosspostError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CrosspostError> {
        Ok(())
    }
}

#[async_trait]
impl PublishTarget for MockTarget {
    fn limits(&self) -> TargetLimits {
        self.limits
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DeliveryError> {
        self.requests.lock().await.push(request.clone());
        match self.script.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(PublishReceipt {
                post_id: format!("mock-post-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
                media_kind: request.media.first().map(|m| m.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> PublishRequest {
        PublishRequest {
            text: text.to_string(),
            media: vec![],
        }
    }

    #[tokio::test]
    async fn unscripted_calls_succeed_with_distinct_ids() {
        let target = MockTarget::new();
        let a = target.publish(&request("a")).await.unwrap();
        let b = target.publish(&request("b")).await.unwrap();
        assert_ne!(a.post_id, b.post_id);
        assert_eq!(target.calls().await, 2);
    }

    #[tokio::test]
    async fn scripted_failures_come_first() {
        let target = MockTarget::new();
        target.fail_times(2, MockTarget::transient()).await;

        assert!(target.publish(&request("x")).await.is_err());
        assert!(target.publish(&request("x")).await.is_err());
        assert!(target.publish(&request("x")).await.is_ok());
        assert_eq!(target.requests().await.len(), 3);
    }
}
