// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the bridging pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite store and
//! mock source and target adapters. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crosspost_bridge::{
    IngestQueue, MessageProcessor, Publisher, SpamFilter, Transformer, known_secrets,
    run_maintenance,
};
use crosspost_core::StorageAdapter;
use crosspost_core::types::{ErrorRecord, PostRecord, PostStatus};
use crosspost_resilience::BackoffPolicy;
use crosspost_test_utils::{MockSource, MockTarget, TestHarness, raw_message};
use tokio_util::sync::CancellationToken;

struct Bridge {
    harness: TestHarness,
    target: MockTarget,
    queue: Arc<IngestQueue>,
    processor: MessageProcessor,
}

impl Bridge {
    async fn new() -> Self {
        Self::with(TestHarness::new().await.unwrap()).await
    }

    async fn with(harness: TestHarness) -> Self {
        let source = MockSource::new();
        let target = MockTarget::new();
        let queue = Arc::new(IngestQueue::new(harness.config.bridge.queue_capacity));
        let config = &harness.config;
        let processor = MessageProcessor::new(
            Arc::clone(&queue),
            Arc::new(source),
            harness.store(),
            SpamFilter::new(config.filter.clone()).unwrap(),
            Transformer::new(&config.transform, config.twitter.max_text_length),
            Publisher::new(
                Arc::new(target.clone()),
                harness.store(),
                BackoffPolicy::from_config(&config.retry),
                known_secrets(config),
            ),
            config.bridge.batch_size,
            config.bridge.publish_media,
            known_secrets(config),
        );
        Self {
            harness,
            target,
            queue,
            processor,
        }
    }

    async fn submit(&self, id: &str, text: &str) {
        self.queue.push(raw_message(id, text)).await.unwrap();
    }

    async fn tick(&self) {
        self.processor.run_tick(&CancellationToken::new()).await;
    }

    async fn record(&self, id: &str) -> Option<PostRecord> {
        self.harness.storage.find_post(id).await.unwrap()
    }

    async fn errors(&self) -> Vec<ErrorRecord> {
        let since = Utc::now() - chrono::Duration::hours(1);
        self.harness.storage.recent_errors(since, 100).await.unwrap()
    }
}

fn long_text() -> String {
    let sentence = "Officials confirmed that the northern rail line will reopen next week after repairs.";
    let mut text = String::new();
    while text.chars().count() < 300 {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(sentence);
    }
    text
}

// ---- Scenario A: spam is filtered ----

#[tokio::test]
async fn scenario_a_url_heavy_message_is_skipped() {
    let bridge = Bridge::new().await;
    bridge
        .submit("a1", "Breaking news!!! http://x http://y http://z")
        .await;
    bridge.tick().await;

    let record = bridge.record("a1").await.unwrap();
    assert_eq!(record.status, PostStatus::Skipped);
    assert!(record.target_post_id.is_none());
    assert_eq!(bridge.target.calls().await, 0);
}

// ---- Scenario B: long text is tagged and truncated ----

#[tokio::test]
async fn scenario_b_long_text_is_truncated_and_posted() {
    let harness = TestHarness::builder()
        .with_config(|c| c.transform.tags = vec!["#news".into(), "#rail".into()])
        .build()
        .await
        .unwrap();
    let bridge = Bridge::with(harness).await;
    let text = long_text();
    assert!(text.chars().count() >= 300);

    bridge.submit("b1", &text).await;
    bridge.tick().await;

    let requests = bridge.target.requests().await;
    assert_eq!(requests.len(), 1);
    let published = &requests[0].text;
    assert!(published.chars().count() <= 280);
    assert!(published.ends_with("... #news #rail"));

    let body = published.trim_end_matches("... #news #rail");
    assert!(text.starts_with(body));
    assert!(text[body.len()..].starts_with(' '), "cut inside a word: {body:?}");

    let record = bridge.record("b1").await.unwrap();
    assert_eq!(record.status, PostStatus::Posted);
    assert!(record.target_post_id.is_some());
    assert_eq!(&record.final_text, published);
}

// ---- Scenario C: duplicate submissions ----

#[tokio::test]
async fn scenario_c_duplicate_is_published_once() {
    let bridge = Bridge::new().await;
    let text = "Museum reopens with a new maritime history wing.";
    bridge.submit("c1", text).await;
    bridge.submit("c1", text).await;
    bridge.tick().await;

    bridge.submit("c1", text).await;
    bridge.tick().await;

    assert_eq!(bridge.target.calls().await, 1);
    let posts = bridge.harness.storage.recent_posts(10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].status, PostStatus::Posted);
}

// ---- Scenario D: rate limits then success ----

#[tokio::test]
async fn scenario_d_rate_limited_three_times_then_posted() {
    let bridge = Bridge::new().await;
    bridge
        .target
        .fail_times(3, MockTarget::rate_limited(None))
        .await;
    bridge
        .submit("d1", "Storm warning lifted for the eastern coast tonight.")
        .await;
    bridge.tick().await;

    assert_eq!(bridge.target.calls().await, 4);
    let record = bridge.record("d1").await.unwrap();
    assert_eq!(record.status, PostStatus::Posted);

    let errors = bridge.errors().await;
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.error_type == "rate_limit"));
    assert!(errors.iter().all(|e| e.source_message_id.as_deref() == Some("d1")));
}

#[tokio::test]
async fn scenario_d_backoff_delays_increase() {
    let harness = TestHarness::new().await.unwrap();
    let target = MockTarget::new();
    target.fail_times(3, MockTarget::rate_limited(None)).await;
    let publisher = Publisher::new(
        Arc::new(target.clone()),
        harness.store(),
        BackoffPolicy::from_config(&harness.config.retry),
        vec![],
    );
    let message = crosspost_core::types::ProcessedMessage {
        raw: raw_message("d2", "Storm warning lifted."),
        cleaned_text: "Storm warning lifted.".into(),
        final_text: "Storm warning lifted.".into(),
        added_tags: vec![],
        truncated: false,
        media: vec![],
    };

    let report = publisher
        .publish(&message, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.delays.len(), 3);
    assert!(report.delays.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(report.delays[0], Duration::from_millis(10));
}

// ---- Scenario E: authentication failure ----

#[tokio::test]
async fn scenario_e_auth_failure_is_not_retried() {
    let bridge = Bridge::new().await;
    bridge
        .target
        .push_outcome(Err(MockTarget::auth_failure()))
        .await;
    bridge
        .submit("e1", "Council publishes the annual transport report.")
        .await;
    bridge.tick().await;

    assert_eq!(bridge.target.calls().await, 1);
    let record = bridge.record("e1").await.unwrap();
    assert_eq!(record.status, PostStatus::Failed);

    let errors = bridge.errors().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, "auth");
}

// ---- Scenario F: retention cleanup ----

fn posted(id: &str, days_ago: i64) -> PostRecord {
    PostRecord {
        source_message_id: id.to_string(),
        target_post_id: Some(format!("t-{id}")),
        channel_id: "-100".to_string(),
        final_text: format!("post {id}"),
        media_type: None,
        status: PostStatus::Posted,
        posted_at: Utc::now() - chrono::Duration::days(days_ago),
    }
}

fn error_at(days_ago: i64) -> ErrorRecord {
    ErrorRecord {
        source_message_id: None,
        error_type: "transient".into(),
        message: "HTTP 503".into(),
        occurred_at: Utc::now() - chrono::Duration::days(days_ago),
    }
}

#[tokio::test]
async fn scenario_f_cleanup_removes_only_expired_rows() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.storage;
    for (id, age) in [("old1", 45), ("old2", 31), ("new1", 29), ("new2", 0)] {
        store.record_post(&posted(id, age)).await.unwrap();
    }
    for age in [40, 2] {
        store.log_error(&error_at(age)).await.unwrap();
    }

    let report = run_maintenance(store.as_ref(), &harness.config.bridge, Utc::now())
        .await
        .unwrap();

    assert_eq!(report.deleted.posts_deleted, 2);
    assert_eq!(report.deleted.errors_deleted, 1);
    assert!(store.find_post("old1").await.unwrap().is_none());
    assert!(store.find_post("old2").await.unwrap().is_none());
    assert!(store.find_post("new1").await.unwrap().is_some());
    assert!(store.find_post("new2").await.unwrap().is_some());

    let stats = store.daily_stats().await.unwrap();
    let total: i64 = stats.iter().map(|d| d.post_count).sum();
    assert_eq!(total, 2);
    assert_eq!(report.posts_total, 2);
    let since = Utc::now() - chrono::Duration::days(365);
    assert_eq!(store.error_count(since).await.unwrap(), 1);
}

// ---- At most one terminal record ----

#[tokio::test]
async fn every_message_ends_with_exactly_one_unchanging_record() {
    let bridge = Bridge::new().await;
    // p1 fails permanently, p2 posts, p3 is spam.
    bridge
        .target
        .push_outcome(Err(MockTarget::auth_failure()))
        .await;
    let messages = [
        ("p1", "Night buses will run on all main routes this weekend."),
        ("p2", "The botanical garden opens its new glasshouse."),
        ("p3", "Huge PROMOTION today only, act fast friends"),
    ];

    let mut first_status = Vec::new();
    for round in 0..3 {
        for (id, text) in messages {
            bridge.submit(id, text).await;
            if round == 0 {
                bridge.submit(id, text).await;
            }
        }
        bridge.tick().await;

        let posts = bridge.harness.storage.recent_posts(100).await.unwrap();
        assert_eq!(posts.len(), messages.len(), "round {round}");
        let mut statuses: Vec<(String, PostStatus)> = posts
            .into_iter()
            .map(|p| (p.source_message_id, p.status))
            .collect();
        statuses.sort_by(|a, b| a.0.cmp(&b.0));
        if round == 0 {
            first_status = statuses;
        } else {
            assert_eq!(statuses, first_status, "status changed in round {round}");
        }
    }

    assert_eq!(bridge.target.calls().await, 2);
    let by_id: std::collections::HashMap<_, _> = first_status.into_iter().collect();
    assert_eq!(by_id["p1"], PostStatus::Failed);
    assert_eq!(by_id["p2"], PostStatus::Posted);
    assert_eq!(by_id["p3"], PostStatus::Skipped);
}
