// ABOUTME: Turns raw server stdout chunks into chat notifications, one per matched line
// ABOUTME: Owns the line buffer; forwards formatted messages to a NotificationSink in line order

use super::accumulator::LineAccumulator;
use super::matcher::{match_line, MatchedEvent};
use crate::config::MessagesConfig;
use crate::template;
use anyhow::Result;

/// Receives formatted notification text from the dispatcher.
///
/// Implementations must not block: the dispatcher calls this inline while
/// processing server output.
pub trait NotificationSink {
    fn forward(&mut self, text: String) -> Result<()>;
}

/// Detects console events in server output and forwards notifications.
///
/// Each instance owns its own pending line buffer, so one dispatcher must be fed
/// from a single task.
pub struct EventDispatcher<S> {
    lines: LineAccumulator,
    messages: MessagesConfig,
    sink: S,
}

impl<S: NotificationSink> EventDispatcher<S> {
    pub fn new(messages: MessagesConfig, sink: S) -> Self {
        Self {
            lines: LineAccumulator::new(),
            messages,
            sink,
        }
    }

    /// Process one chunk of server stdout.
    ///
    /// Forwarding failures are logged and do not stop processing of later lines.
    pub fn on_chunk(&mut self, chunk: impl AsRef<[u8]>) {
        for line in self.lines.feed(chunk) {
            let event = match_line(&line);
            let Some(text) = self.format(&event) else {
                continue;
            };

            tracing::info!(event = event.kind(), "Server event detected");

            if let Err(e) = self.sink.forward(text) {
                tracing::warn!(
                    event = event.kind(),
                    error = %e,
                    "Failed to forward notification, continuing"
                );
            }
        }
    }

    /// Render the configured message for an event; `None` for unmatched lines
    pub fn format(&self, event: &MatchedEvent) -> Option<String> {
        match event {
            MatchedEvent::ServerReady => Some(self.messages.server_start.clone()),
            MatchedEvent::PlayerJoined { name } => {
                Some(template::render(&self.messages.join, &[name.as_str()]))
            }
            MatchedEvent::PlayerLeft { name } => {
                Some(template::render(&self.messages.leave, &[name.as_str()]))
            }
            MatchedEvent::Unmatched => None,
        }
    }

    /// Text received so far that is not yet terminated by a newline
    pub fn pending(&self) -> std::borrow::Cow<'_, str> {
        self.lines.pending()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
