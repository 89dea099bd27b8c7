// ABOUTME: A single Telegram chat as a send target
// ABOUTME: Handles plain-text sending with 4096-char chunking at line boundaries

use anyhow::{Context, Result};
use teloxide::prelude::*;

/// Maximum message length for Telegram Bot API
const MAX_MESSAGE_LENGTH: usize = 4096;

/// A Telegram chat the bot can post to
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    chat_id: ChatId,
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(chat_id: ChatId, bot: Bot) -> Self {
        Self { chat_id, bot }
    }

    /// Build a channel from a destination string such as `-100123456789`
    pub fn from_destination(destination: &str, bot: Bot) -> Result<Self> {
        let chat_id = destination
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Invalid Telegram chat ID '{}'", destination))?;
        Ok(Self::new(ChatId(chat_id), bot))
    }

    /// Send a text message, splitting into chunks if it exceeds Telegram's limit
    pub async fn send_text(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        for chunk in chunk_text(text, MAX_MESSAGE_LENGTH) {
            self.bot
                .send_message(self.chat_id, chunk)
                .await
                .context("Failed to send message")?;
        }
        Ok(())
    }
}

/// Split text into chunks at line boundaries, falling back to character boundaries
fn chunk_text(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining);
            break;
        }

        let mut limit = max_len;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }

        // Try to split at a newline within the limit
        let split_at = remaining[..limit]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(limit);

        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }

    chunks
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_short() {
        let chunks = chunk_text("Alice join server.", 4096);
        assert_eq!(chunks, vec!["Alice join server."]);
    }

    #[test]
    fn test_chunk_text_splits_at_newline() {
        let line1 = "a".repeat(3000);
        let line2 = "b".repeat(3000);
        let text = format!("{}\n{}", line1, line2);
        let chunks = chunk_text(&text, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 3001);
        assert_eq!(chunks[1], line2);
    }

    #[test]
    fn test_chunk_text_no_newlines() {
        let text = "a".repeat(5000);
        let chunks = chunk_text(&text, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn test_chunk_text_respects_char_boundaries() {
        let text = "é".repeat(3000);
        let chunks = chunk_text(&text, 4097);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 4097));
    }

    #[test]
    fn test_from_destination_parses_negative_ids() {
        let bot = Bot::new("fake_token");
        let channel = TelegramChannel::from_destination("-100123456789", bot).unwrap();
        assert_eq!(channel.chat_id, ChatId(-100123456789));
    }

    #[test]
    fn test_from_destination_rejects_garbage() {
        let bot = Bot::new("fake_token");
        assert!(TelegramChannel::from_destination("my-chat", bot).is_err());
    }

    #[test]
    fn test_telegram_channel_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TelegramChannel>();
    }
}
