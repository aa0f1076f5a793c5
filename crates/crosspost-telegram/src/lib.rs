// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel source adapter for the crosspost bridge.
//!
//! Implements [`SourceAdapter`] on the Telegram Bot API via teloxide. The bot
//! must be an administrator of the watched channel to receive `channel_post`
//! updates. Posts are normalized into [`RawMessage`] inside the polling task
//! and handed over through a bounded channel, so a slow consumer applies
//! backpressure to long polling instead of buffering without limit.

pub mod handler;
pub mod media;

use async_trait::async_trait;
use crosspost_config::model::TelegramConfig;
use crosspost_core::error::CrosspostError;
use crosspost_core::traits::{PluginAdapter, SourceAdapter};
use crosspost_core::types::{AdapterType, HealthStatus, MediaRef, RawMessage, ResolvedMedia};
use teloxide::prelude::*;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::handler::ChannelSelector;

/// Telegram source adapter implementing [`SourceAdapter`].
pub struct TelegramSource {
    bot: Bot,
    selector: ChannelSelector,
    inbound_rx: Mutex<mpsc::Receiver<RawMessage>>,
    /// Moved into the polling task on connect; the stream ends when that task does.
    inbound_tx: Option<mpsc::Sender<RawMessage>>,
    polling_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TelegramSource {
    /// Creates the adapter. Requires `bot_token` and `channel` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, CrosspostError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CrosspostError::Config("telegram.bot_token is required".into()))?;
        let channel = config
            .channel
            .as_deref()
            .ok_or_else(|| CrosspostError::Config("telegram.channel is required".into()))?;
        let selector = ChannelSelector::parse(channel)?;

        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer.max(1));
        Ok(Self {
            bot: Bot::new(token),
            selector,
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            polling_handle: Mutex::new(None),
        })
    }

    pub fn selector(&self) -> &ChannelSelector {
        &self.selector
    }
}

#[async_trait]
impl PluginAdapter for TelegramSource {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, CrosspostError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), CrosspostError> {
        if let Some(handle) = self.polling_handle.lock().await.take() {
            handle.abort();
            debug!("Telegram polling stopped");
        }
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for TelegramSource {
    async fn connect(&mut self) -> Result<(), CrosspostError> {
        let Some(tx) = self.inbound_tx.take() else {
            return Ok(()); // Already connected
        };

        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| CrosspostError::SourceConnection {
                message: format!("Telegram authentication failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        // Resolving the chat proves the bot can see the channel and pins its id.
        let chat = self
            .bot
            .get_chat(self.selector.recipient())
            .await
            .map_err(|e| CrosspostError::SourceConnection {
                message: format!("cannot access Telegram channel {:?}: {e}", self.selector),
                source: Some(Box::new(e)),
            })?;
        if !chat.is_channel() {
            return Err(CrosspostError::SourceConnection {
                message: format!("Telegram chat {} is not a channel", chat.id),
                source: None,
            });
        }
        self.selector = ChannelSelector::Id(chat.id);

        info!(
            bot = %me.username(),
            channel_id = chat.id.0,
            title = chat.title().unwrap_or_default(),
            "starting Telegram long polling"
        );

        let bot = self.bot.clone();
        let selector = self.selector.clone();
        let handle = tokio::spawn(async move {
            let handler = Update::filter_channel_post().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let selector = selector.clone();
                async move {
                    if !selector.matches(&msg.chat) {
                        debug!(chat_id = msg.chat.id.0, "ignoring post from other channel");
                        return respond(());
                    }
                    match handler::to_raw_message(&msg) {
                        Some(raw) => {
                            if tx.send(raw).await.is_err() {
                                warn!(msg_id = msg.id.0, "source stream closed, dropping post");
                            }
                        }
                        None => debug!(msg_id = msg.id.0, "ignoring post without content"),
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        *self.polling_handle.lock().await = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<RawMessage>, CrosspostError> {
        Ok(self.inbound_rx.lock().await.recv().await)
    }

    async fn resolve_media(&self, media: &MediaRef) -> Result<ResolvedMedia, CrosspostError> {
        media::download(&self.bot, media).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>, channel: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            channel: channel.map(String::from),
            inbound_buffer: 4,
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramSource::new(&config(None, Some("@news"))).is_err());
        assert!(TelegramSource::new(&config(Some(" "), Some("@news"))).is_err());
    }

    #[test]
    fn new_requires_channel() {
        let err = TelegramSource::new(&config(Some("123:abc"), None))
            .err()
            .unwrap();
        assert_eq!(err.error_type(), "config");
    }

    #[test]
    fn new_parses_channel() {
        let source = TelegramSource::new(&config(Some("123:abc"), Some("@news"))).unwrap();
        assert_eq!(source.selector(), &ChannelSelector::Username("news".into()));
        assert_eq!(source.adapter_type(), AdapterType::Source);
        assert_eq!(source.name(), "telegram");
    }

    #[tokio::test]
    async fn shutdown_before_connect_is_noop() {
        let source = TelegramSource::new(&config(Some("123:abc"), Some("-100"))).unwrap();
        source.shutdown().await.unwrap();
    }
}
