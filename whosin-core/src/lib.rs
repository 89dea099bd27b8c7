// ABOUTME: Platform-agnostic core of the server-to-chat bridge
// ABOUTME: Line-buffered console event detection, message formatting, config, and transport traits

pub mod config;
pub mod detector;
pub mod launch;
pub mod outbox;
pub mod paths;
pub mod relay;
pub mod template;
pub mod traits;

pub use detector::{EventDispatcher, LineAccumulator, MatchedEvent, NotificationSink};
pub use outbox::{Outbox, OutboxReceiver};

// Re-export core traits for convenient access
pub use traits::{BotCommand, ChatTransport, ChatUser, EventStream, IncomingMessage};
