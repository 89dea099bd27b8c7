// ABOUTME: Ordered fire-and-forget delivery of notifications to a chat transport
// ABOUTME: The dispatcher enqueues without blocking; one delivery loop sends in submission order

use crate::detector::NotificationSink;
use crate::traits::ChatTransport;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending half of the notification queue, handed to the EventDispatcher
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

/// Receiving half, drained by [`deliver`]
#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

/// Create a connected outbox pair
pub fn channel() -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox { tx }, OutboxReceiver { rx })
}

impl NotificationSink for Outbox {
    fn forward(&mut self, text: String) -> Result<()> {
        self.tx
            .send(text)
            .ok()
            .context("Notification delivery loop has stopped")
    }
}

impl OutboxReceiver {
    /// Next queued notification, or `None` once every `Outbox` is dropped
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Send queued notifications to `destination` one at a time, in order.
///
/// A failed send is logged and skipped. Returns the number of messages delivered
/// once all senders are gone.
pub async fn deliver(
    mut outbox: OutboxReceiver,
    transport: Arc<dyn ChatTransport>,
    destination: String,
) -> usize {
    let mut delivered = 0;
    while let Some(text) = outbox.recv().await {
        match transport.send(&destination, &text).await {
            Ok(()) => {
                delivered += 1;
                tracing::debug!(
                    platform = transport.platform_id(),
                    destination = %destination,
                    "Notification delivered"
                );
            }
            Err(e) => {
                tracing::error!(
                    platform = transport.platform_id(),
                    destination = %destination,
                    error = %e,
                    "Failed to deliver notification"
                );
            }
        }
    }
    tracing::info!(delivered, "Notification queue closed");
    delivered
}
