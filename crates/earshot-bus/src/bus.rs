//! Publish/subscribe message bus.
//!
//! The bus provides a lightweight fan-out mechanism built on top of
//! [`tokio::sync::broadcast`].  Skills and host components communicate
//! exclusively through [`Message`]s emitted onto the bus.
//!
//! Messages are wrapped in [`Arc`] so that broadcasting to multiple
//! subscribers does not require cloning the payload.
//!
//! # Usage
//!
//! ```rust,no_run
//! # use earshot_bus::{MessageBus, Message};
//! # async fn example() {
//! let bus = MessageBus::new(256);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(Message::new("converse.ping").with_data("skill", "parrotskill"))
//!     .unwrap();
//!
//! let message = rx.recv().await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::message::Message;

/// Publish/subscribe bus backed by [`tokio::sync::broadcast`].
///
/// The bus is cheaply cloneable (`Arc`-backed) and `Send + Sync`.
/// Subscribers receive [`Arc<Message>`] references, avoiding per-subscriber
/// cloning of the payload.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    sender: broadcast::Sender<Arc<Message>>,
}

impl MessageBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// If a subscriber falls behind by more than `capacity` messages, it will
    /// receive a [`broadcast::error::RecvError::Lagged`] error indicating how
    /// many messages were missed.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(BusInner { sender }),
        }
    }

    /// Emit a message to all current subscribers.
    ///
    /// Returns the number of receivers that will observe this message.  If
    /// there are no active subscribers the message is silently dropped (this
    /// is not considered an error during early startup).
    pub fn emit(&self, message: Message) -> Result<usize> {
        let msg_type = message.msg_type.clone();
        match self.inner.sender.send(Arc::new(message)) {
            Ok(n) => {
                tracing::trace!(msg_type = %msg_type, receivers = n, "message emitted");
                Ok(n)
            }
            Err(_) => {
                // No active receivers -- this is common during startup/shutdown.
                tracing::trace!(msg_type = %msg_type, "message emitted but no active receivers");
                Ok(0)
            }
        }
    }

    /// Create a new subscriber that will receive all future messages.
    ///
    /// Messages emitted *before* this call are **not** replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Message>> {
        tracing::trace!("new bus subscriber created");
        self.inner.sender.subscribe()
    }

    /// Return the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
