//! SNMP receive-and-respond engine.
//!
//! A [`Receiver`] takes inbound datagrams, decodes them, answers every
//! well-formed request with a Response echoing its request id and
//! varbinds, and publishes what it saw through an [`EventSink`].
//!
//! # Pipeline
//!
//! Each datagram passes through three stages in [`Receiver::on_datagram`]:
//!
//! 1. **Decode.** Failure increments [`Receiver::malformed_messages`],
//!    publishes an [`InvalidMessage`] and ends processing. Nothing is sent.
//! 2. **Respond.** The response is built, encoded and sent, either through
//!    the socket the datagram arrived on or through a one-shot socket from
//!    the [`SocketFactory`]. An error or panic publishes a [`MessageError`]
//!    and processing continues with stage 3.
//! 3. **Handle.** [`MessageHooks::augment_message`], the `message` event and
//!    [`MessageHooks::process_message`] run inside one failure boundary. An
//!    error or panic there publishes exactly one [`MessageError`].
//!
//! No stage lets an error or panic escape: the receiver keeps serving.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_receiver::AddressFamily;
//! use async_snmp_receiver::receiver::Receiver;
//!
//! # async fn example() -> async_snmp_receiver::Result<()> {
//! let receiver = Receiver::builder(tracing::info_span!("snmp"))
//!     .name("edge-agent")
//!     .build();
//!
//! receiver.events().on_message(|msg| {
//!     println!("{} from {:?}", msg.pdu.pdu_type, msg.src);
//!     Ok(())
//! });
//! receiver.events().on_invalid_message(|ev| {
//!     eprintln!("garbage from {}", ev.source);
//! });
//!
//! let socket = receiver.create_socket(AddressFamily::Udp4).await?;
//! println!("listening on {}", socket.local_addr());
//!
//! tokio::signal::ctrl_c().await.ok();
//! socket.close().await;
//! # Ok(())
//! # }
//! ```

mod hooks;
mod listener;
mod response;

pub use hooks::{DefaultHooks, MessageHooks};
pub use listener::ListeningSocket;

use std::any::Any;
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, instrument};

use crate::endpoint::{AddressFamily, RawDatagram};
use crate::error::{Error, Result};
use crate::events::{EventSink, InvalidMessage, MessageError};
use crate::message::{BerCodec, Codec, Message};
use crate::transport::{DatagramSocket, SocketFactory, UdpEndpoint, UdpSocketFactory};

/// Display name used when none is configured.
pub const DEFAULT_NAME: &str = "async-snmp-receiver";

/// Builder for [`Receiver`].
///
/// Defaults:
/// - name: [`DEFAULT_NAME`]
/// - codec: [`BerCodec`] (SNMPv1/v2c)
/// - socket factory: [`UdpSocketFactory`]
/// - hooks: [`DefaultHooks`]
/// - cancellation: a fresh token
pub struct ReceiverBuilder {
    log: Span,
    name: Option<String>,
    codec: Option<Arc<dyn Codec>>,
    socket_factory: Option<Arc<dyn SocketFactory>>,
    hooks: Option<Arc<dyn MessageHooks>>,
    cancel: Option<CancellationToken>,
}

impl ReceiverBuilder {
    fn new(log: Span) -> Self {
        Self {
            log,
            name: None,
            codec: None,
            socket_factory: None,
            hooks: None,
            cancel: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the wire codec.
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Replace the factory used for one-shot reply sockets.
    pub fn socket_factory(mut self, factory: Arc<dyn SocketFactory>) -> Self {
        self.socket_factory = Some(factory);
        self
    }

    /// Install per-message hooks.
    pub fn hooks(mut self, hooks: Arc<dyn MessageHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Use `token` as the parent of every listening socket's token.
    ///
    /// Cancelling it stops all receive loops, same as [`Receiver::shutdown`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the receiver. No socket is opened.
    pub fn build(self) -> Receiver {
        Receiver {
            inner: Arc::new(ReceiverInner {
                name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
                log: self.log,
                codec: self.codec.unwrap_or_else(|| Arc::new(BerCodec)),
                socket_factory: self
                    .socket_factory
                    .unwrap_or_else(|| Arc::new(UdpSocketFactory)),
                hooks: self.hooks.unwrap_or_else(|| Arc::new(DefaultHooks)),
                events: EventSink::new(),
                malformed_messages: AtomicU64::new(0),
                cancel: self.cancel.unwrap_or_default(),
            }),
        }
    }
}

struct ReceiverInner {
    name: String,
    log: Span,
    codec: Arc<dyn Codec>,
    socket_factory: Arc<dyn SocketFactory>,
    hooks: Arc<dyn MessageHooks>,
    events: EventSink,
    malformed_messages: AtomicU64,
    cancel: CancellationToken,
}

/// SNMP receive-and-respond engine.
///
/// Cheap to clone; clones share counters, subscribers and configuration.
#[derive(Clone)]
pub struct Receiver {
    inner: Arc<ReceiverInner>,
}

impl Receiver {
    /// Start building a receiver. Every event the receiver logs is recorded
    /// inside `log`.
    pub fn builder(log: Span) -> ReceiverBuilder {
        ReceiverBuilder::new(log)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Span the pipeline runs in.
    pub fn log(&self) -> &Span {
        &self.inner.log
    }

    /// Event subscriptions.
    pub fn events(&self) -> &EventSink {
        &self.inner.events
    }

    /// Number of datagrams that failed to decode since construction.
    pub fn malformed_messages(&self) -> u64 {
        self.inner.malformed_messages.load(Ordering::Relaxed)
    }

    /// Parent cancellation token of all listening sockets.
    pub fn cancel(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Stop every receive loop started by this receiver.
    ///
    /// Datagrams already accepted are still processed to completion.
    pub fn shutdown(&self) {
        tracing::debug!(target: "async_snmp_receiver::receiver", { receiver = %self.inner.name }, "receiver shutdown requested");
        self.inner.cancel.cancel();
    }

    /// Bind a listening socket on the family's wildcard address, on an
    /// OS-assigned port, and start serving it.
    pub async fn create_socket(&self, family: AddressFamily) -> Result<ListeningSocket> {
        self.create_socket_at(family.unspecified()).await
    }

    /// Bind a listening socket on `addr` and start serving it.
    ///
    /// Replies to datagrams received here go out through the same socket.
    #[instrument(skip(self), err, fields(receiver = %self.inner.name))]
    pub async fn create_socket_at(&self, addr: SocketAddr) -> Result<ListeningSocket> {
        let endpoint = Arc::new(UdpEndpoint::bind(addr)?);
        Ok(ListeningSocket::spawn(
            self.clone(),
            endpoint,
            self.inner.cancel.child_token(),
        ))
    }

    /// Run one datagram through the pipeline.
    ///
    /// `socket` is the socket the datagram arrived on, if the caller wants
    /// the reply sent through it; it is never closed. Without one, a
    /// one-shot socket is created for the reply and closed after sending.
    ///
    /// Never fails: every problem is published as an event.
    pub async fn on_datagram(&self, raw: RawDatagram, socket: Option<Arc<dyn DatagramSocket>>) {
        let span = self.inner.log.clone();
        self.run_pipeline(raw, socket).instrument(span).await
    }

    async fn run_pipeline(&self, raw: RawDatagram, socket: Option<Arc<dyn DatagramSocket>>) {
        let mut message = match self.inner.codec.decode(&raw.bytes, &raw.source) {
            Ok(message) => message,
            Err(error) => {
                self.reject(raw, error);
                return;
            }
        };

        let responded = AssertUnwindSafe(self.respond(&message, socket.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panicked(payload)));
        if let Err(error) = responded {
            self.report(error, message.clone());
        }

        let handled = catch_unwind(AssertUnwindSafe(|| {
            self.handle(&mut message, socket.as_deref())
        }))
        .unwrap_or_else(|payload| Err(panicked(payload)));
        if let Err(error) = handled {
            self.report(error, message);
        }
    }

    fn reject(&self, raw: RawDatagram, error: Box<Error>) {
        self.inner.malformed_messages.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: "async_snmp_receiver::receiver", { snmp.source = %raw.source, snmp.bytes = raw.len, error = %error }, "invalid SNMP message");
        self.inner.events.emit_invalid_message(&InvalidMessage {
            error,
            raw: raw.bytes,
            source: raw.source,
        });
    }

    async fn respond(
        &self,
        message: &Message,
        socket: Option<&Arc<dyn DatagramSocket>>,
    ) -> Result<()> {
        let response = response::build_response(self.inner.codec.as_ref(), message)?;
        response::send_response(&response, socket, self.inner.socket_factory.as_ref()).await
    }

    fn handle(&self, message: &mut Message, socket: Option<&dyn DatagramSocket>) -> Result<()> {
        self.inner.hooks.augment_message(message, socket)?;

        if let Some(src) = message.src {
            tracing::trace!(target: "async_snmp_receiver::receiver", { snmp.source = %src, snmp.pdu_type = %message.pdu.pdu_type, snmp.request_id = message.pdu.request_id }, "received SNMP message");
        }
        self.inner.events.emit_message(message)?;

        self.inner.hooks.process_message(message)
    }

    fn report(&self, error: Box<Error>, message: Message) {
        let source = message.src;
        tracing::warn!(target: "async_snmp_receiver::receiver", { snmp.source = ?source, snmp.request_id = message.pdu.request_id, error = %error }, "error processing message");
        self.inner.events.emit_message_error(&MessageError {
            error,
            message,
            source,
        });
    }
}

/// Turn a caught panic payload into an error.
fn panicked(payload: Box<dyn Any + Send>) -> Box<Error> {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    Error::Panicked(message.into()).boxed()
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("name", &self.inner.name)
            .field("malformed_messages", &self.malformed_messages())
            .field("events", &self.inner.events)
            .finish_non_exhaustive()
    }
}
