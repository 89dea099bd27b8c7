// ABOUTME: Handles inbound chat messages: bot commands and the optional chat-to-server relay
// ABOUTME: Answers /getChatroomId and injects chat text into the server as `say` commands

use crate::supervisor::ServerConsole;
use anyhow::Result;
use futures_util::StreamExt;
use std::sync::Arc;
use whosin_core::relay::console_command;
use whosin_core::traits::{ChatTransport, EventStream, IncomingMessage};

/// What the relay did with one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Answered a bot command in the originating chat
    Replied,
    /// Queued a console command on the server's stdin
    Injected(String),
    /// Dropped (relay disabled, other chat, or unknown command)
    Ignored,
}

pub struct ChatRelay {
    transport: Arc<dyn ChatTransport>,
    console: ServerConsole,
    /// Chat whose messages are relayed into the game
    destination: String,
    chat_to_server: bool,
    chat_format: String,
    /// Commands naming a different `@bot` are left to that bot
    bot_username: Option<String>,
}

impl ChatRelay {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        console: ServerConsole,
        destination: impl Into<String>,
        chat_to_server: bool,
        chat_format: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            console,
            destination: destination.into(),
            chat_to_server,
            chat_format: chat_format.into(),
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Process inbound messages until the stream ends
    pub async fn run(self, mut events: EventStream) {
        while let Some(msg) = events.next().await {
            match self.handle(&msg).await {
                Ok(outcome) => {
                    tracing::debug!(
                        channel_id = %msg.channel_id,
                        event_id = %msg.event_id,
                        ?outcome,
                        "Inbound message handled"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        channel_id = %msg.channel_id,
                        error = %e,
                        "Error handling inbound message"
                    );
                }
            }
        }
        tracing::info!("Inbound message stream ended");
    }

    pub async fn handle(&self, msg: &IncomingMessage) -> Result<RelayOutcome> {
        if let Some(command) = msg.command() {
            if !command.is_addressed_to(self.bot_username.as_deref()) {
                tracing::debug!(
                    command = command.name,
                    mention = ?command.mention,
                    "Ignoring command addressed to another bot"
                );
                return Ok(RelayOutcome::Ignored);
            }
            return self.handle_command(command.name, msg).await;
        }

        if !self.chat_to_server {
            return Ok(RelayOutcome::Ignored);
        }

        if msg.channel_id != self.destination {
            tracing::debug!(
                channel_id = %msg.channel_id,
                "Ignoring message from a chat other than the configured chatroom"
            );
            return Ok(RelayOutcome::Ignored);
        }

        let command = console_command(&self.chat_format, msg.sender.label(), &msg.body);
        self.console.send(command.clone()).await?;
        tracing::info!(sender = %msg.sender.label(), "Relayed chat message to server");
        Ok(RelayOutcome::Injected(command))
    }

    async fn handle_command(&self, command: &str, msg: &IncomingMessage) -> Result<RelayOutcome> {
        match command {
            "getChatroomId" => {
                let reply = format!("This chatroom id: {}", msg.channel_id);
                self.transport.send(&msg.channel_id, &reply).await?;
                Ok(RelayOutcome::Replied)
            }
            _ => Ok(RelayOutcome::Ignored),
        }
    }
}
