// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram chat backend for the chanbridge connector.
//!
//! Implements [`ChatBackend`] for the Telegram Bot API via teloxide. Group
//! messages and channel posts arrive through long polling and are queued for
//! [`ChatBackend::next_update`].
//!
//! Bots cannot join chats on their own; they are added by an administrator.
//! `join` therefore confirms that the bot can see the chat, and `leave`
//! removes the bot from it.

pub mod handler;

use async_trait::async_trait;
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chanbridge_core::{
    AdapterType, Channel, ChanbridgeError, ChatBackend, ChatUser, HealthStatus, PluginAdapter,
    UpdateEvent,
};

/// Capacity of the queue between the dispatcher and the forwarder.
const INBOUND_BUFFER: usize = 100;

fn backend_err(context: &str, e: teloxide::RequestError) -> ChanbridgeError {
    ChanbridgeError::Backend {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Telegram backend implementing [`ChatBackend`].
pub struct TelegramBackend {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<UpdateEvent>>,
    inbound_tx: mpsc::Sender<UpdateEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_token: Option<ShutdownToken>,
}

impl TelegramBackend {
    /// Creates a backend for the given bot token. Does not contact Telegram.
    pub fn new(token: &str) -> Result<Self, ChanbridgeError> {
        if token.trim().is_empty() {
            return Err(ChanbridgeError::Config(
                "telegram bot token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
            shutdown_token: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramBackend {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, ChanbridgeError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ChanbridgeError> {
        if let Some(token) = &self.shutdown_token {
            match token.shutdown() {
                Ok(stopped) => {
                    stopped.await;
                    debug!("Telegram dispatcher stopped");
                }
                Err(_) => debug!("Telegram dispatcher was idle or already stopping"),
            }
        }
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for TelegramBackend {
    async fn connect(&mut self) -> Result<(), ChanbridgeError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let forward = |tx: mpsc::Sender<UpdateEvent>| {
            move |msg: Message| {
                let tx = tx.clone();
                async move {
                    match handler::to_update_event(&msg) {
                        Some(update) => {
                            if tx.send(update).await.is_err() {
                                warn!("update queue closed, dropping message");
                            }
                        }
                        None => debug!(chat_id = msg.chat.id.0, msg_id = msg.id.0, "ignoring message"),
                    }
                    respond(())
                }
            }
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(forward(self.inbound_tx.clone())))
            .branch(Update::filter_channel_post().endpoint(forward(self.inbound_tx.clone())));

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {})
            .build();
        self.shutdown_token = Some(dispatcher.shutdown_token());

        info!("starting Telegram long polling");
        self.polling_handle = Some(tokio::spawn(async move {
            dispatcher.dispatch().await;
        }));
        Ok(())
    }

    async fn current_user(&self) -> Result<ChatUser, ChanbridgeError> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| backend_err("failed to fetch bot identity", e))?;
        Ok(ChatUser {
            id: me.user.id.0 as i64,
            username: me.user.username.clone(),
            display_name: me.user.full_name(),
        })
    }

    async fn join(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        let chat = self
            .bot
            .get_chat(ChatId(channel.id))
            .await
            .map_err(|e| backend_err(&format!("bot has no access to chat {}", channel.id), e))?;
        debug!(channel_id = channel.id, title = chat.title().unwrap_or_default(), "chat access confirmed");
        Ok(())
    }

    async fn leave(&self, channel_id: i64) -> Result<(), ChanbridgeError> {
        self.bot
            .leave_chat(ChatId(channel_id))
            .await
            .map_err(|e| backend_err(&format!("failed to leave chat {channel_id}"), e))?;
        Ok(())
    }

    async fn next_update(&self) -> Result<UpdateEvent, ChanbridgeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| ChanbridgeError::Closed {
            what: "Telegram update stream".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            TelegramBackend::new("  "),
            Err(ChanbridgeError::Config(_))
        ));
    }

    #[tokio::test]
    async fn adapter_identity() {
        let backend = TelegramBackend::new("123:abc").unwrap();
        assert_eq!(backend.name(), "telegram");
        assert_eq!(backend.adapter_type(), AdapterType::Backend);
        assert_eq!(backend.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn shutdown_before_connect_is_a_no_op() {
        let backend = TelegramBackend::new("123:abc").unwrap();
        backend.shutdown().await.unwrap();
    }
}
