// ABOUTME: Telegram platform implementation for the server bridge
// ABOUTME: Outbound ChatTransport plus a long-polling inbound event stream of text messages

pub mod channel;

pub use channel::TelegramChannel;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{MediaKind, MessageKind, UpdateKind};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use whosin_core::config::TelegramConfig;
use whosin_core::traits::{ChatTransport, ChatUser, EventStream, IncomingMessage};

/// Long polling timeout passed to getUpdates, in seconds
const POLL_TIMEOUT_SECS: u32 = 30;

/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

/// Telegram platform implementation using teloxide with long polling
pub struct TelegramPlatform {
    bot: Bot,
    /// Bot's numeric user ID as a string
    bot_user_id: String,
    /// Bot's @username, without the `@`
    bot_username: String,
    /// Users allowed to talk to the bot (empty = everyone)
    allowed_users: Arc<Vec<i64>>,
}

impl TelegramPlatform {
    /// Create a new TelegramPlatform from config.
    ///
    /// Resolves the bot's user ID via the `getMe` API call.
    pub async fn new(config: &TelegramConfig) -> Result<Self> {
        let bot = Bot::new(&config.bot_token);

        let me = bot.get_me().await.context("Failed to call Telegram getMe")?;
        let bot_user_id = me.id.0.to_string();

        tracing::info!(
            bot_username = %me.username(),
            bot_id = %bot_user_id,
            "Telegram bot authenticated"
        );

        Ok(Self {
            bot,
            bot_user_id,
            bot_username: me.username().to_string(),
            allowed_users: Arc::new(config.allowed_users.clone()),
        })
    }

    /// Username that addresses commands to this bot, as in `/getChatroomId@<username>`
    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Start long polling and return the stream of inbound text messages.
    ///
    /// Polling errors are logged and retried after a short pause.
    pub fn event_stream(&self) -> EventStream {
        let (tx, rx) = mpsc::channel(256);
        let bot = self.bot.clone();
        let bot_user_id = self.bot_user_id.clone();
        let allowed_users = Arc::clone(&self.allowed_users);

        tokio::spawn(async move {
            let mut offset: i32 = 0;

            loop {
                let updates = match bot
                    .get_updates()
                    .offset(offset)
                    .timeout(POLL_TIMEOUT_SECS)
                    .await
                {
                    Ok(updates) => updates,
                    Err(e) => {
                        tracing::warn!(
                            platform = "telegram",
                            error = %e,
                            "Long polling error, retrying in 5s"
                        );
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        continue;
                    }
                };

                for update in &updates {
                    offset = update.id.as_offset();

                    let message = match &update.kind {
                        UpdateKind::Message(msg) => msg,
                        _ => continue,
                    };

                    let body = match &message.kind {
                        MessageKind::Common(common) => match &common.media_kind {
                            MediaKind::Text(text) => text.text.clone(),
                            _ => continue,
                        },
                        _ => continue,
                    };

                    let Some(from) = message.from.as_ref() else {
                        continue;
                    };

                    // Skip messages from the bot itself
                    if from.id.0.to_string() == bot_user_id {
                        continue;
                    }

                    if !is_user_allowed(&allowed_users, from.id.0 as i64) {
                        tracing::debug!(
                            platform = "telegram",
                            user_id = from.id.0,
                            "Skipping message from non-allowed user"
                        );
                        continue;
                    }

                    let sender = ChatUser::with_name(
                        from.id.0.to_string(),
                        display_name(&from.first_name, from.last_name.as_deref()),
                    );

                    let msg = IncomingMessage {
                        platform_id: "telegram".to_string(),
                        channel_id: message.chat.id.0.to_string(),
                        sender,
                        body,
                        event_id: message.id.0.to_string(),
                        timestamp: message.date.timestamp(),
                    };

                    if tx.send(msg).await.is_err() {
                        tracing::warn!(platform = "telegram", "Event stream receiver dropped");
                        return;
                    }
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

#[async_trait]
impl ChatTransport for TelegramPlatform {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let channel = TelegramChannel::from_destination(destination, self.bot.clone())?;
        channel.send_text(text).await
    }

    fn platform_id(&self) -> &'static str {
        "telegram"
    }
}

/// Empty allowlist means allow all
fn is_user_allowed(allowed_users: &[i64], user_id: i64) -> bool {
    allowed_users.is_empty() || allowed_users.contains(&user_id)
}

fn display_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name {
        Some(last) if !last.is_empty() => format!("{} {}", first_name, last),
        _ => first_name.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
