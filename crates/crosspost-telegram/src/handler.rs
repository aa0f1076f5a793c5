// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel matching and normalization of Telegram channel posts.
//!
//! Everything downstream sees only [`RawMessage`]; this module is the one
//! place that knows the Bot API message shape.

use crosspost_core::error::CrosspostError;
use crosspost_core::types::{MediaKind, MediaRef, RawMessage};
use teloxide::types::{Chat, ChatId, Message, Recipient};

/// The watched channel, as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelector {
    /// Public channel username without the leading `@`.
    Username(String),
    Id(ChatId),
}

impl ChannelSelector {
    /// Parse `@username`, `username` or a numeric chat id such as `-1001234567890`.
    pub fn parse(raw: &str) -> Result<Self, CrosspostError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CrosspostError::Config(
                "telegram.channel cannot be empty".into(),
            ));
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Ok(ChannelSelector::Id(ChatId(id)));
        }
        let name = raw.strip_prefix('@').unwrap_or(raw);
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CrosspostError::Config(format!(
                "telegram.channel `{raw}` is neither a chat id nor a channel username"
            )));
        }
        Ok(ChannelSelector::Username(name.to_string()))
    }

    /// Bot API recipient for `getChat`.
    pub fn recipient(&self) -> Recipient {
        match self {
            ChannelSelector::Username(name) => Recipient::ChannelUsername(format!("@{name}")),
            ChannelSelector::Id(id) => Recipient::Id(*id),
        }
    }

    /// Whether a chat is the watched channel.
    pub fn matches(&self, chat: &Chat) -> bool {
        match self {
            ChannelSelector::Id(id) => chat.id == *id,
            ChannelSelector::Username(name) => chat
                .username()
                .is_some_and(|u| u.eq_ignore_ascii_case(name)),
        }
    }
}

/// Media references carried by a post, largest photo variant only.
///
/// Documents count as media when their MIME type is an image or video.
pub fn extract_media(msg: &Message) -> Vec<MediaRef> {
    // Animations also populate `document`, so check them first.
    if let Some(animation) = msg.animation() {
        return vec![MediaRef {
            file_id: animation.file.id.to_string(),
            kind: MediaKind::Animation,
            mime_type: animation.mime_type.as_ref().map(|m| m.to_string()),
        }];
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return vec![MediaRef {
            file_id: photo.file.id.to_string(),
            kind: MediaKind::Photo,
            mime_type: Some("image/jpeg".to_string()),
        }];
    }
    if let Some(video) = msg.video() {
        return vec![MediaRef {
            file_id: video.file.id.to_string(),
            kind: MediaKind::Video,
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
        }];
    }
    if let Some(doc) = msg.document()
        && let Some(mime) = doc.mime_type.as_ref()
    {
        let kind = match mime.type_().as_str() {
            "image" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        };
        if let Some(kind) = kind {
            return vec![MediaRef {
                file_id: doc.file.id.to_string(),
                kind,
                mime_type: Some(mime.to_string()),
            }];
        }
    }
    Vec::new()
}

/// Normalize a channel post into a [`RawMessage`].
///
/// Returns `None` for posts with neither text nor supported media
/// (stickers, polls, service messages).
pub fn to_raw_message(msg: &Message) -> Option<RawMessage> {
    let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();
    let media = extract_media(msg);
    if text.trim().is_empty() && media.is_empty() {
        return None;
    }
    Some(RawMessage {
        source_message_id: msg.id.0.to_string(),
        channel_id: msg.chat.id.0.to_string(),
        text: text.to_string(),
        media,
        created_at: msg.date,
    })
}
