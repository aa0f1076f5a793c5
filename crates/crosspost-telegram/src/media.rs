// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downloading attachment content from Telegram servers.

use crosspost_core::error::CrosspostError;
use crosspost_core::types::{MediaKind, MediaRef, ResolvedMedia};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;

/// Fallback MIME type when Telegram did not report one.
pub fn default_mime(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "image/jpeg",
        // Telegram re-encodes GIF animations as silent MP4.
        MediaKind::Video | MediaKind::Animation => "video/mp4",
    }
}

/// Resolve a file id with `getFile`, then download the bytes.
pub async fn download(bot: &Bot, media: &MediaRef) -> Result<ResolvedMedia, CrosspostError> {
    let file = bot
        .get_file(FileId(media.file_id.clone()))
        .await
        .map_err(|e| CrosspostError::SourceConnection {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data)
        .await
        .map_err(|e| CrosspostError::SourceConnection {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %media.file_id, kind = %media.kind, size = data.len(), "downloaded media");
    Ok(ResolvedMedia {
        kind: media.kind,
        mime_type: media
            .mime_type
            .clone()
            .unwrap_or_else(|| default_mime(media.kind).to_string()),
        data,
    })
}
