// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish pacing: minimum spacing between calls and a fixed-window quota.

use std::time::Duration;

use crosspost_core::types::TargetLimits;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Default)]
struct PacerState {
    last_call: Option<Instant>,
    window_started: Option<Instant>,
    window_count: u32,
}

/// Spaces publish calls according to a target's [`TargetLimits`].
///
/// Every call that passes [`acquire`](PublishPacer::acquire) counts against
/// the window quota, retries included.
#[derive(Debug)]
pub struct PublishPacer {
    min_interval: Duration,
    posts_per_window: u32,
    window: Duration,
    state: Mutex<PacerState>,
}

impl PublishPacer {
    pub fn new(limits: &TargetLimits) -> Self {
        Self {
            min_interval: limits.min_interval,
            posts_per_window: limits.posts_per_window.max(1),
            window: limits.window,
            state: Mutex::new(PacerState::default()),
        }
    }

    /// Wait until a publish call is allowed and reserve the slot.
    ///
    /// Returns `false` without reserving if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let wait = self.wait_at(&mut state, Instant::now());
                if wait.is_zero() {
                    return true;
                }
                wait
            };
            debug!(wait_ms = wait.as_millis() as u64, "pacing publish call");
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Time until the next call is allowed. Reserves the slot when zero.
    fn wait_at(&self, state: &mut PacerState, now: Instant) -> Duration {
        let spacing = state
            .last_call
            .map(|last| self.min_interval.saturating_sub(now.duration_since(last)))
            .unwrap_or(Duration::ZERO);

        if let Some(started) = state.window_started
            && now.duration_since(started) >= self.window
        {
            state.window_started = None;
            state.window_count = 0;
        }
        let quota = match state.window_started {
            Some(started) if state.window_count >= self.posts_per_window => {
                self.window.saturating_sub(now.duration_since(started))
            }
            _ => Duration::ZERO,
        };

        let wait = spacing.max(quota);
        if wait.is_zero() {
            state.last_call = Some(now);
            state.window_started.get_or_insert(now);
            state.window_count += 1;
        }
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(min_secs: u64, per_window: u32, window_secs: u64) -> TargetLimits {
        TargetLimits {
            max_text_length: 280,
            min_interval: Duration::from_secs(min_secs),
            posts_per_window: per_window,
            window: Duration::from_secs(window_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let pacer = PublishPacer::new(&limits(5, 10, 60));
        let start = Instant::now();
        assert!(pacer.acquire(&CancellationToken::new()).await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_are_spaced() {
        let pacer = PublishPacer::new(&limits(5, 10, 60));
        let cancel = CancellationToken::new();
        let start = Instant::now();
        pacer.acquire(&cancel).await;
        pacer.acquire(&cancel).await;
        pacer.acquire(&cancel).await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn window_quota_blocks_until_reset() {
        let pacer = PublishPacer::new(&limits(0, 2, 100));
        let cancel = CancellationToken::new();
        let start = Instant::now();
        pacer.acquire(&cancel).await;
        pacer.acquire(&cancel).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        pacer.acquire(&cancel).await;
        assert!(start.elapsed() >= Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_wait() {
        let pacer = PublishPacer::new(&limits(3600, 10, 86_400));
        let cancel = CancellationToken::new();
        assert!(pacer.acquire(&cancel).await);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let start = Instant::now();
        assert!(!pacer.acquire(&cancel).await);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
