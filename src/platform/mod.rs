// ABOUTME: Chat platform implementations for the server bridge
// ABOUTME: Re-exports the Telegram platform used for notifications and the chat relay

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramPlatform};
