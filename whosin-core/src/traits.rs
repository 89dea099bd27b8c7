// ABOUTME: Core traits and data types shared between the detector and chat platforms
// ABOUTME: ChatTransport (outbound send), IncomingMessage/ChatUser (inbound relay), EventStream

use anyhow::Result;
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

// =============================================================================
// User Identity
// =============================================================================

/// Identity of a chat user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatUser {
    /// Unique identifier (e.g., Telegram numeric user id)
    pub id: String,
    /// Display name
    pub display_name: Option<String>,
}

impl ChatUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_name(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(name.into()),
        }
    }

    /// Name to show in relayed messages, falling back to the raw id
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

// =============================================================================
// Incoming Message
// =============================================================================

/// Incoming text message from a chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Which platform this message came from (e.g., "telegram")
    pub platform_id: String,
    /// The chat this message was sent in
    pub channel_id: String,
    /// The user who sent the message
    pub sender: ChatUser,
    /// Message body (text content)
    pub body: String,
    /// Platform-specific event ID
    pub event_id: String,
    /// Timestamp in seconds since Unix epoch
    pub timestamp: i64,
}

impl IncomingMessage {
    /// Returns the bot command if the body starts with `/`.
    ///
    /// Arguments are dropped and a trailing `@botname` mention is split off, so
    /// `/getChatroomId@my_bot now` yields `getChatroomId` mentioning `my_bot`.
    pub fn command(&self) -> Option<BotCommand<'_>> {
        let rest = self.body.strip_prefix('/')?;
        let word = rest.split_whitespace().next()?;
        let (name, mention) = match word.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (word, None),
        };
        (!name.is_empty()).then_some(BotCommand { name, mention })
    }
}

/// A `/command` parsed from a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotCommand<'a> {
    pub name: &'a str,
    /// Bot username after `@`, if the command names one
    pub mention: Option<&'a str>,
}

impl BotCommand<'_> {
    /// Whether this command is meant for the bot called `bot_username`.
    ///
    /// Commands without a mention are addressed to every bot in the chat. Usernames
    /// compare case-insensitively. With no known username every command matches.
    pub fn is_addressed_to(&self, bot_username: Option<&str>) -> bool {
        match (self.mention, bot_username) {
            (Some(mention), Some(username)) => {
                mention.eq_ignore_ascii_case(username.trim_start_matches('@'))
            }
            _ => true,
        }
    }
}

/// Boxed stream type for inbound platform events
pub type EventStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

// =============================================================================
// Outbound transport
// =============================================================================

/// Outbound side of a chat platform: deliver text to a destination.
///
/// Delivery is best-effort. Callers log failures and move on.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message to the given destination (chat id)
    async fn send(&self, destination: &str, text: &str) -> Result<()>;

    /// Platform identifier for logging (e.g., "telegram")
    fn platform_id(&self) -> &'static str;
}
