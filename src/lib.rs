//! # async-snmp-receiver
//!
//! Async SNMP receive-and-respond engine built on Tokio.
//!
//! ## Features
//!
//! - SNMPv1 and v2c message decoding and encoding
//! - Automatic Response for every well-formed request, echoing its
//!   request id and varbinds
//! - Malformed datagrams counted and published, never answered
//! - Hooks and event subscriptions for everything the receiver sees
//! - Pluggable codec and socket factory, with mock sockets behind the
//!   `testing` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_snmp_receiver::{AddressFamily, Receiver};
//!
//! #[tokio::main]
//! async fn main() -> async_snmp_receiver::Result<()> {
//!     let receiver = Receiver::builder(tracing::info_span!("snmp")).build();
//!
//!     receiver.events().on_message(|msg| {
//!         println!("{} request {} from {:?}", msg.pdu.pdu_type, msg.pdu.request_id, msg.src);
//!         Ok(())
//!     });
//!
//!     let socket = receiver.create_socket(AddressFamily::Udp4).await?;
//!     println!("listening on {}", socket.local_addr());
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     receiver.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Feeding datagrams directly
//!
//! [`Receiver::on_datagram`] runs the pipeline on a datagram obtained any
//! other way. Without a reply socket the response goes out through a
//! one-shot socket from the configured [`transport::SocketFactory`].
//!
//! ```rust,no_run
//! use async_snmp_receiver::{Endpoint, RawDatagram, Receiver};
//! use bytes::Bytes;
//!
//! # async fn example(bytes: Bytes) {
//! let receiver = Receiver::builder(tracing::Span::none()).build();
//! let source = Endpoint::from("192.0.2.7:40000".parse::<std::net::SocketAddr>().unwrap());
//! receiver.on_datagram(RawDatagram::new(bytes, source), None).await;
//! println!("malformed so far: {}", receiver.malformed_messages());
//! # }
//! ```

pub mod ber;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod receiver;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use endpoint::{AddressFamily, Endpoint, RawDatagram};
pub use error::{DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, Result};
pub use events::{EventSink, InvalidMessage, MessageError, ReceiverEvent, SubscriptionId};
pub use message::{BerCodec, Codec, Message};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use receiver::{DefaultHooks, ListeningSocket, MessageHooks, Receiver, ReceiverBuilder};
pub use transport::{BoxFuture, DatagramSocket, SocketFactory, UdpEndpoint, UdpSocketFactory};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;

/// Testing utilities exposed via the `testing` feature.
#[cfg(feature = "testing")]
pub mod testing {
    pub use crate::transport::{MockSocket, MockSocketFactory, SentDatagram};
}
