// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! X (Twitter) publish target for the crosspost bridge.
//!
//! Posts through API v2 `POST /2/tweets` with OAuth 1.0a user context and
//! uploads attachments through the v1.1 media endpoint. Each call to
//! [`PublishTarget::publish`] is a single attempt; failures are classified
//! into [`DeliveryError`] so the caller can decide whether to retry.
//!
//! Uploaded media ids are kept until the post using them succeeds or fails
//! for good, so a retried attempt does not upload the same bytes again.

pub mod classify;
pub mod media;
pub mod oauth;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crosspost_config::model::TwitterConfig;
use crosspost_core::error::{CrosspostError, DeliveryError, PermanentKind};
use crosspost_core::traits::{PluginAdapter, PublishTarget};
use crosspost_core::types::{
    AdapterType, HealthStatus, MediaKind, PublishReceipt, PublishRequest, ResolvedMedia,
    TargetLimits,
};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use sha1::{Digest, Sha1};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classify::classify_transport;
use crate::media::read_json;
use crate::oauth::OAuthCredentials;

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// Attachments ready to reference from a post.
#[derive(Debug, Default)]
struct PreparedMedia {
    ids: Vec<String>,
    /// Content digests, used to forget the uploads once the post is settled.
    digests: Vec<String>,
    first_kind: Option<MediaKind>,
}

/// Publish target for X.
#[derive(Debug, Clone)]
pub struct TwitterPublisher {
    client: reqwest::Client,
    credentials: OAuthCredentials,
    api_base_url: String,
    upload_base_url: String,
    limits: TargetLimits,
    /// Content digest to media id for uploads awaiting a successful post.
    uploaded: Arc<Mutex<HashMap<String, String>>>,
}

impl TwitterPublisher {
    /// Build the publisher. All four OAuth credentials are required.
    pub fn new(config: &TwitterConfig) -> Result<Self, CrosspostError> {
        let require = |value: &Option<String>, key: &str| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| CrosspostError::Config(format!("twitter.{key} is required")))
        };
        let credentials = OAuthCredentials {
            consumer_key: require(&config.api_key, "api_key")?,
            consumer_secret: require(&config.api_secret, "api_secret")?,
            token: require(&config.access_token, "access_token")?,
            token_secret: require(&config.access_token_secret, "access_token_secret")?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("crosspost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrosspostError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            limits: config.limits(),
            uploaded: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Upload every attachment not uploaded by an earlier attempt.
    ///
    /// An attachment X rejects as invalid is dropped and the post goes out
    /// without it. Other upload failures fail the attempt.
    async fn prepare_media(
        &self,
        media: &[ResolvedMedia],
    ) -> Result<PreparedMedia, DeliveryError> {
        let mut prepared = PreparedMedia::default();
        for item in media {
            let digest = format!("{:x}", Sha1::digest(&item.data));
            let cached = self.uploaded.lock().await.get(&digest).cloned();
            let media_id = match cached {
                Some(id) => {
                    debug!(media_id = %id, "reusing uploaded media");
                    id
                }
                None => match self.upload_media(item).await {
                    Ok(id) => {
                        self.uploaded.lock().await.insert(digest.clone(), id.clone());
                        id
                    }
                    Err(
                        e @ DeliveryError::Permanent {
                            kind: PermanentKind::Validation,
                            ..
                        },
                    ) => {
                        warn!(
                            kind = %item.kind,
                            error = %e,
                            "attachment rejected by X, publishing without it"
                        );
                        continue;
                    }
                    Err(e) => return Err(e),
                },
            };
            prepared.first_kind.get_or_insert(item.kind);
            prepared.ids.push(media_id);
            prepared.digests.push(digest);
        }
        Ok(prepared)
    }

    async fn create_post(
        &self,
        text: &str,
        media: &PreparedMedia,
    ) -> Result<PublishReceipt, DeliveryError> {
        let media_ids = &media.ids;
        let body = if media_ids.is_empty() {
            json!({ "text": text })
        } else {
            json!({ "text": text, "media": { "media_ids": media_ids } })
        };

        let url = self.tweets_url();
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.credentials.authorization("POST", &url, &[]))
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let tweet: TweetResponse = read_json(response).await?;
        info!(post_id = %tweet.data.id, media = media_ids.len(), "published to X");
        Ok(PublishReceipt {
            post_id: tweet.data.id,
            media_kind: media.first_kind,
        })
    }

    fn tweets_url(&self) -> String {
        format!("{}/2/tweets", self.api_base_url)
    }
}

#[async_trait]
impl PluginAdapter for TwitterPublisher {
    fn name(&self) -> &str {
        "twitter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Target
    }

    async fn health_check(&self) -> Result<HealthStatus, CrosspostError> {
        let url = format!("{}/2/users/me", self.api_base_url);
        let result = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.credentials.authorization("GET", &url, &[]))
            .send()
            .await;
        Ok(match result {
            Ok(resp) if resp.status().is_success() => HealthStatus::Healthy,
            Ok(resp) if matches!(resp.status().as_u16(), 401 | 403) => {
                HealthStatus::Unhealthy(format!("X API rejected credentials ({})", resp.status()))
            }
            Ok(resp) => HealthStatus::Degraded(format!("X API returned {}", resp.status())),
            Err(e) => HealthStatus::Degraded(format!("X API unreachable: {e}")),
        })
    }

    async fn shutdown(&self) -> Result<(), CrosspostError> {
        debug!("X publisher shutting down");
        Ok(())
    }
}

#[async_trait]
impl PublishTarget for TwitterPublisher {
    fn limits(&self) -> TargetLimits {
        self.limits
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DeliveryError> {
        if request.text.chars().count() > self.limits.max_text_length {
            return Err(DeliveryError::Permanent {
                kind: PermanentKind::Validation,
                message: format!(
                    "text exceeds {} characters",
                    self.limits.max_text_length
                ),
            });
        }

        let media = self.prepare_media(&request.media).await?;
        let result = self.create_post(&request.text, &media).await;

        let will_retry = matches!(&result, Err(e) if e.is_retryable());
        if !will_retry && !media.digests.is_empty() {
            let mut uploaded = self.uploaded.lock().await;
            for digest in &media.digests {
                uploaded.remove(digest);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_core::types::{MediaKind, ResolvedMedia};
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> TwitterConfig {
        TwitterConfig {
            api_key: Some("ck".into()),
            api_secret: Some("cs".into()),
            access_token: Some("at".into()),
            access_token_secret: Some("ats".into()),
            api_base_url: base.to_string(),
            upload_base_url: base.to_string(),
            request_timeout_secs: 5,
            ..TwitterConfig::default()
        }
    }

    fn text_request(text: &str) -> PublishRequest {
        PublishRequest {
            text: text.to_string(),
            media: Vec::new(),
        }
    }

    #[test]
    fn new_requires_all_credentials() {
        let mut cfg = config("http://localhost");
        cfg.access_token_secret = None;
        let err = TwitterPublisher::new(&cfg).unwrap_err();
        assert!(err.to_string().contains("access_token_secret"));
    }

    #[test]
    fn limits_come_from_config() {
        let publisher = TwitterPublisher::new(&config("http://localhost")).unwrap();
        assert_eq!(publisher.limits().max_text_length, 280);
        assert_eq!(publisher.adapter_type(), AdapterType::Target);
    }

    #[tokio::test]
    async fn publish_text_returns_post_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header_exists("authorization"))
            .and(body_json(json!({ "text": "hello from the channel" })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "data": { "id": "1790", "text": "hello from the channel" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let receipt = publisher
            .publish(&text_request("hello from the channel"))
            .await
            .unwrap();
        assert_eq!(receipt.post_id, "1790");
    }

    #[tokio::test]
    async fn authorization_header_is_oauth1() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "1" } })))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        publisher.publish(&text_request("hi there")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("OAuth "));
        assert!(auth.contains("oauth_consumer_key=\"ck\""));
        assert!(auth.contains("oauth_token=\"at\""));
        assert!(auth.contains("oauth_signature="));
    }

    #[tokio::test]
    async fn health_check_flags_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let status = publisher.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn health_check_treats_server_errors_as_degraded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let status = publisher.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded(_)));
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "42")
                    .set_body_json(json!({ "title": "Too Many Requests" })),
            )
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let err = publisher.publish(&text_request("hi there")).await.unwrap_err();
        assert_eq!(err.error_type(), "rate_limit");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
    }

    #[tokio::test]
    async fn unauthorized_is_permanent_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "title": "Unauthorized" })))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let err = publisher.publish(&text_request("hi there")).await.unwrap_err();
        assert_eq!(err.error_type(), "auth");
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let err = publisher.publish(&text_request("hi there")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.error_type(), "transient");
    }

    #[tokio::test]
    async fn unreachable_host_is_transient() {
        // Port 9 (discard) on localhost is closed in test environments.
        let publisher = TwitterPublisher::new(&config("http://127.0.0.1:9")).unwrap();
        let err = publisher.publish(&text_request("hi there")).await.unwrap_err();
        assert_eq!(err.error_type(), "transient");
    }

    #[tokio::test]
    async fn overlong_text_is_rejected_locally() {
        let publisher = TwitterPublisher::new(&config("http://127.0.0.1:9")).unwrap();
        let err = publisher
            .publish(&text_request(&"a".repeat(281)))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "validation");
    }

    #[tokio::test]
    async fn photo_is_uploaded_then_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "m-77" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": "with photo", "media": { "media_ids": ["m-77"] } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "9" } })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let receipt = publisher
            .publish(&PublishRequest {
                text: "with photo".into(),
                media: vec![ResolvedMedia {
                    kind: MediaKind::Photo,
                    mime_type: "image/jpeg".into(),
                    data: vec![0xFF, 0xD8, 0xFF],
                }],
            })
            .await
            .unwrap();
        assert_eq!(receipt.post_id, "9");
    }

    #[tokio::test]
    async fn failed_upload_skips_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "9" } })))
            .expect(0)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let err = publisher
            .publish(&PublishRequest {
                text: "with photo".into(),
                media: vec![ResolvedMedia {
                    kind: MediaKind::Photo,
                    mime_type: "image/jpeg".into(),
                    data: vec![1, 2, 3],
                }],
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "transient");
    }

    fn photo_request(text: &str) -> PublishRequest {
        PublishRequest {
            text: text.into(),
            media: vec![ResolvedMedia {
                kind: MediaKind::Photo,
                mime_type: "image/jpeg".into(),
                data: vec![0xFF, 0xD8, 0xFF, 0xE0],
            }],
        }
    }

    #[tokio::test]
    async fn rejected_attachment_is_dropped_and_text_still_posted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "errors": [{ "message": "media type unrecognized" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": "photo went missing" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "11" } })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let receipt = publisher
            .publish(&photo_request("photo went missing"))
            .await
            .unwrap();
        assert_eq!(receipt.post_id, "11");
        assert_eq!(receipt.media_kind, None);
    }

    #[tokio::test]
    async fn retried_post_reuses_uploaded_media() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "m-5" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": "second try", "media": { "media_ids": ["m-5"] } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "12" } })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let request = photo_request("second try");
        let err = publisher.publish(&request).await.unwrap_err();
        assert_eq!(err.error_type(), "rate_limit");
        let receipt = publisher.publish(&request).await.unwrap();
        assert_eq!(receipt.post_id, "12");
        assert_eq!(receipt.media_kind, Some(MediaKind::Photo));
        assert!(publisher.uploaded.lock().await.is_empty());
    }

    #[tokio::test]
    async fn video_uses_chunked_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1.1/media/upload.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "media_id_string": "v-1",
                "processing_info": { "state": "succeeded" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({ "text": "clip", "media": { "media_ids": ["v-1"] } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "10" } })))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::new(&config(&server.uri())).unwrap();
        let receipt = publisher
            .publish(&PublishRequest {
                text: "clip".into(),
                media: vec![ResolvedMedia {
                    kind: MediaKind::Video,
                    mime_type: "video/mp4".into(),
                    data: vec![0; 1024],
                }],
            })
            .await
            .unwrap();
        assert_eq!(receipt.post_id, "10");

        // INIT, one APPEND, FINALIZE, then the post.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 4);
        let init = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(init.contains("command=INIT"), "{init}");
        assert!(init.contains("media_category=tweet_video"), "{init}");
    }
}
