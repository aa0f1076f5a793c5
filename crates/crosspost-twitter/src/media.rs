// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media upload through the v1.1 upload endpoint.
//!
//! Photos use a single multipart upload. Videos and animations use the
//! chunked INIT / APPEND / FINALIZE flow and wait for server-side processing.

use std::time::Duration;

use crosspost_core::error::DeliveryError;
use crosspost_core::types::{MediaKind, ResolvedMedia};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::TwitterPublisher;
use crate::classify::{classify_status, classify_transport};
use crate::oauth::form_encode;

/// APPEND segment size (the endpoint accepts up to 5 MB per segment).
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Upper bound on STATUS polls while the server transcodes a video.
const MAX_STATUS_POLLS: u32 = 20;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    media_id_string: String,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
    #[serde(default)]
    error: Option<ProcessingError>,
}

#[derive(Debug, Deserialize)]
struct ProcessingError {
    #[serde(default)]
    message: Option<String>,
}

fn media_category(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "tweet_image",
        MediaKind::Video => "tweet_video",
        MediaKind::Animation => "tweet_gif",
    }
}

impl TwitterPublisher {
    /// Upload one attachment and return its media id.
    pub(crate) async fn upload_media(&self, media: &ResolvedMedia) -> Result<String, DeliveryError> {
        match media.kind {
            MediaKind::Photo => self.upload_simple(media).await,
            MediaKind::Video | MediaKind::Animation => self.upload_chunked(media).await,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/1.1/media/upload.json", self.upload_base_url)
    }

    async fn upload_simple(&self, media: &ResolvedMedia) -> Result<String, DeliveryError> {
        let url = self.upload_url();
        let form = Form::new().part("media", media_part(media, media.data.clone())?);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.credentials.authorization("POST", &url, &[]))
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        let uploaded: UploadResponse = read_json(response).await?;
        debug!(media_id = %uploaded.media_id_string, "photo uploaded");
        Ok(uploaded.media_id_string)
    }

    async fn upload_chunked(&self, media: &ResolvedMedia) -> Result<String, DeliveryError> {
        let init = self
            .post_form(&[
                ("command", "INIT".to_string()),
                ("total_bytes", media.data.len().to_string()),
                ("media_type", media.mime_type.clone()),
                ("media_category", media_category(media.kind).to_string()),
            ])
            .await?;
        let media_id = init.media_id_string;

        let url = self.upload_url();
        for (index, chunk) in media.data.chunks(CHUNK_SIZE).enumerate() {
            let form = Form::new()
                .text("command", "APPEND")
                .text("media_id", media_id.clone())
                .text("segment_index", index.to_string())
                .part("media", media_part(media, chunk.to_vec())?);
            let response = self
                .client
                .post(&url)
                .header(AUTHORIZATION, self.credentials.authorization("POST", &url, &[]))
                .multipart(form)
                .send()
                .await
                .map_err(|e| classify_transport(&e))?;
            if !response.status().is_success() {
                return Err(error_from(response).await);
            }
        }

        let finalized = self
            .post_form(&[
                ("command", "FINALIZE".to_string()),
                ("media_id", media_id.clone()),
            ])
            .await?;
        self.await_processing(&media_id, finalized.processing_info)
            .await?;
        debug!(media_id = %media_id, kind = %media.kind, "chunked upload complete");
        Ok(media_id)
    }

    async fn await_processing(
        &self,
        media_id: &str,
        mut info: Option<ProcessingInfo>,
    ) -> Result<(), DeliveryError> {
        let mut polls = 0;
        while let Some(current) = info {
            match current.state.as_str() {
                "succeeded" => return Ok(()),
                "failed" => {
                    let reason = current
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "unknown reason".to_string());
                    return Err(DeliveryError::Permanent {
                        kind: crosspost_core::error::PermanentKind::Validation,
                        message: format!("media processing failed: {reason}"),
                    });
                }
                _ if polls >= MAX_STATUS_POLLS => {
                    return Err(DeliveryError::Transient {
                        message: format!("media {media_id} still processing"),
                    });
                }
                _ => {}
            }
            polls += 1;
            let wait = current.check_after_secs.unwrap_or(1).clamp(1, 30);
            tokio::time::sleep(Duration::from_secs(wait)).await;

            let params = [
                ("command", "STATUS".to_string()),
                ("media_id", media_id.to_string()),
            ];
            let url = self.upload_url();
            let response = self
                .client
                .get(format!("{url}?{}", form_encode(&params)))
                .header(AUTHORIZATION, self.credentials.authorization("GET", &url, &params))
                .send()
                .await
                .map_err(|e| classify_transport(&e))?;
            info = read_json::<UploadResponse>(response).await?.processing_info;
        }
        Ok(())
    }

    async fn post_form(&self, params: &[(&str, String)]) -> Result<UploadResponse, DeliveryError> {
        let url = self.upload_url();
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.credentials.authorization("POST", &url, params))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_encode(params))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        read_json(response).await
    }
}

fn media_part(media: &ResolvedMedia, bytes: Vec<u8>) -> Result<Part, DeliveryError> {
    Part::bytes(bytes)
        .file_name("media")
        .mime_str(&media.mime_type)
        .map_err(|e| DeliveryError::Permanent {
            kind: crosspost_core::error::PermanentKind::Validation,
            message: format!("invalid media type `{}`: {e}", media.mime_type),
        })
}

/// Decode a successful JSON response or classify the failure.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DeliveryError> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    let body = response.text().await.map_err(|e| classify_transport(&e))?;
    serde_json::from_str(&body).map_err(|e| DeliveryError::Permanent {
        kind: crosspost_core::error::PermanentKind::Validation,
        message: format!("unexpected X API response: {e}"),
    })
}

/// Classify a non-success response.
pub(crate) async fn error_from(response: reqwest::Response) -> DeliveryError {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, &headers, &body, chrono::Utc::now())
}
