//! Observable receiver events.
//!
//! Three kinds of events leave the receive pipeline:
//!
//! - **message**: a datagram decoded into a [`Message`]
//! - **invalid message**: a datagram failed to decode ([`InvalidMessage`])
//! - **message error**: handling a decoded message failed ([`MessageError`])
//!
//! Subscribers are plain closures. Dispatch is synchronous and follows
//! registration order. Each dispatch works on a snapshot of the subscriber
//! list, so a callback may subscribe or unsubscribe without deadlocking;
//! the change takes effect from the next event on.
//!
//! # Example
//!
//! ```rust
//! use async_snmp_receiver::events::{EventSink, ReceiverEvent};
//!
//! let sink = EventSink::new();
//! let id = sink.on_invalid_message(|ev| {
//!     eprintln!("garbage from {}: {}", ev.source, ev.error);
//! });
//! assert_eq!(sink.subscriber_count(ReceiverEvent::InvalidMessage), 1);
//! assert!(sink.unsubscribe(id));
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::message::Message;

/// Handle returned by the `on_*` methods, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event kinds, for [`EventSink::subscriber_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverEvent {
    Message,
    InvalidMessage,
    MessageError,
}

/// A datagram that could not be decoded.
#[derive(Debug)]
pub struct InvalidMessage {
    /// Decode error (always [`Error::MalformedMessage`] for the default codec).
    pub error: Box<Error>,
    /// The datagram bytes as received.
    pub raw: Bytes,
    /// Sender of the datagram.
    pub source: Endpoint,
}

/// A decoded message whose handling failed.
#[derive(Debug)]
pub struct MessageError {
    /// What went wrong.
    pub error: Box<Error>,
    /// The message being handled, including any augmentation already applied.
    pub message: Message,
    /// Sender of the message.
    pub source: Option<Endpoint>,
}

type MessageCallback = Arc<dyn Fn(&Message) -> Result<()> + Send + Sync>;
type InvalidMessageCallback = Arc<dyn Fn(&InvalidMessage) + Send + Sync>;
type MessageErrorCallback = Arc<dyn Fn(&MessageError) + Send + Sync>;

struct Subscribers<F: ?Sized> {
    entries: RwLock<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> Subscribers<F> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn push(&self, id: SubscriptionId, callback: Arc<F>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }
}

/// Publish/subscribe hub for receiver events.
pub struct EventSink {
    next_id: AtomicU64,
    message: Subscribers<dyn Fn(&Message) -> Result<()> + Send + Sync>,
    invalid_message: Subscribers<dyn Fn(&InvalidMessage) + Send + Sync>,
    message_error: Subscribers<dyn Fn(&MessageError) + Send + Sync>,
}

impl EventSink {
    /// Create a sink with no subscribers.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            message: Subscribers::new(),
            invalid_message: Subscribers::new(),
            message_error: Subscribers::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to decoded messages.
    ///
    /// Returning `Err` stops dispatch to later subscribers and reports the
    /// error as a [`MessageError`].
    pub fn on_message<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Message) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id();
        let callback: MessageCallback = Arc::new(callback);
        self.message.push(id, callback);
        id
    }

    /// Subscribe to datagrams that failed to decode.
    pub fn on_invalid_message<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&InvalidMessage) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let callback: InvalidMessageCallback = Arc::new(callback);
        self.invalid_message.push(id, callback);
        id
    }

    /// Subscribe to failures while handling decoded messages.
    pub fn on_message_error<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&MessageError) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let callback: MessageErrorCallback = Arc::new(callback);
        self.message_error.push(id, callback);
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.message.remove(id) || self.invalid_message.remove(id) || self.message_error.remove(id)
    }

    /// Number of subscribers for an event kind.
    pub fn subscriber_count(&self, event: ReceiverEvent) -> usize {
        match event {
            ReceiverEvent::Message => self.message.len(),
            ReceiverEvent::InvalidMessage => self.invalid_message.len(),
            ReceiverEvent::MessageError => self.message_error.len(),
        }
    }

    /// Dispatch a decoded message. Stops at the first subscriber error.
    ///
    /// Panics in subscribers propagate to the caller, which is the
    /// pipeline's post-response failure boundary.
    pub(crate) fn emit_message(&self, message: &Message) -> Result<()> {
        for callback in self.message.snapshot() {
            callback(message)?;
        }
        Ok(())
    }

    pub(crate) fn emit_invalid_message(&self, event: &InvalidMessage) {
        for callback in self.invalid_message.snapshot() {
            guarded(ReceiverEvent::InvalidMessage, || callback(event));
        }
    }

    pub(crate) fn emit_message_error(&self, event: &MessageError) {
        for callback in self.message_error.snapshot() {
            guarded(ReceiverEvent::MessageError, || callback(event));
        }
    }
}

/// Run a subscriber, containing any panic so later subscribers still run.
fn guarded(event: ReceiverEvent, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(target: "async_snmp_receiver::events", { event = ?event }, "event subscriber panicked");
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("message", &self.message.len())
            .field("invalid_message", &self.invalid_message.len())
            .field("message_error", &self.message_error.len())
            .finish()
    }
}
