//! In-process receiver for testing.
//!
//! Binds to an ephemeral loopback port and forwards every event into a
//! channel so tests can await them. Shuts down on drop.

use async_snmp_receiver::events::{InvalidMessage, MessageError};
use async_snmp_receiver::{
    DefaultHooks, Endpoint, ListeningSocket, Message, MessageHooks, Receiver,
};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::WAIT;

/// Builder for [`TestReceiver`].
pub struct TestReceiverBuilder {
    hooks: Arc<dyn MessageHooks>,
    name: String,
}

impl TestReceiverBuilder {
    /// Install custom hooks.
    pub fn hooks(mut self, hooks: Arc<dyn MessageHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the receiver name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Build the receiver and start listening on 127.0.0.1.
    pub async fn start(self) -> TestReceiver {
        let receiver = Receiver::builder(tracing::info_span!("test-receiver"))
            .name(self.name)
            .hooks(self.hooks)
            .build();

        let (message_tx, messages) = mpsc::unbounded_channel();
        receiver.events().on_message(move |msg| {
            let _ = message_tx.send(msg.clone());
            Ok(())
        });

        let (invalid_tx, invalid) = mpsc::unbounded_channel();
        receiver.events().on_invalid_message(move |ev: &InvalidMessage| {
            let _ = invalid_tx.send((ev.raw.clone(), ev.source));
        });

        let (error_tx, errors) = mpsc::unbounded_channel();
        receiver.events().on_message_error(move |ev: &MessageError| {
            let _ = error_tx.send((ev.error.to_string(), ev.message.clone()));
        });

        let socket = receiver
            .create_socket_at("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        TestReceiver {
            addr: socket.local_addr(),
            receiver,
            socket: Some(socket),
            messages,
            invalid,
            errors,
        }
    }
}

/// A receiver listening on a loopback port.
pub struct TestReceiver {
    pub receiver: Receiver,
    addr: SocketAddr,
    socket: Option<ListeningSocket>,
    messages: mpsc::UnboundedReceiver<Message>,
    invalid: mpsc::UnboundedReceiver<(Bytes, Endpoint)>,
    errors: mpsc::UnboundedReceiver<(String, Message)>,
}

impl TestReceiver {
    /// Start a receiver with default hooks.
    pub async fn new() -> Self {
        Self::builder().start().await
    }

    pub fn builder() -> TestReceiverBuilder {
        TestReceiverBuilder {
            hooks: Arc::new(DefaultHooks),
            name: "test-receiver".to_string(),
        }
    }

    /// Listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Next published message.
    pub async fn next_message(&mut self) -> Message {
        tokio::time::timeout(WAIT, self.messages.recv())
            .await
            .expect("timed out waiting for message event")
            .unwrap()
    }

    /// Next invalid-message event.
    pub async fn next_invalid(&mut self) -> (Bytes, Endpoint) {
        tokio::time::timeout(WAIT, self.invalid.recv())
            .await
            .expect("timed out waiting for invalid-message event")
            .unwrap()
    }

    /// Next message-error event.
    pub async fn next_error(&mut self) -> (String, Message) {
        tokio::time::timeout(WAIT, self.errors.recv())
            .await
            .expect("timed out waiting for message-error event")
            .unwrap()
    }

    /// Whether any message-error event is pending.
    pub fn has_errors(&mut self) -> bool {
        !self.errors.is_empty()
    }

    /// Close the listening socket.
    pub async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close().await;
        }
    }
}

impl Drop for TestReceiver {
    fn drop(&mut self) {
        self.receiver.shutdown();
    }
}
