//! Socket abstraction used by the receive pipeline.
//!
//! The pipeline only ever needs to send one datagram and, for sockets it
//! created itself, close it again. [`DatagramSocket`] captures exactly that;
//! [`SocketFactory`] creates the ephemeral sockets used when no reply socket
//! is supplied with a datagram.
//!
//! Both traits are object safe so the receiver can hold them as
//! `Arc<dyn ...>` and tests can swap in [`MockSocketFactory`].

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::endpoint::{AddressFamily, Endpoint};
use crate::error::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, `Send` future returned by the socket traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A bound datagram socket the pipeline can reply through.
pub trait DatagramSocket: Send + Sync {
    /// Send one datagram to `target`.
    fn send_to<'a>(&'a self, data: &'a [u8], target: Endpoint) -> BoxFuture<'a, Result<()>>;

    /// Release the socket. Sends after close fail.
    fn close(&self) -> BoxFuture<'_, ()>;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;
}

/// Creates sockets on demand.
pub trait SocketFactory: Send + Sync {
    /// Bind a new socket of the given family on an OS-assigned port.
    fn bind(&self, family: AddressFamily) -> BoxFuture<'_, Result<Arc<dyn DatagramSocket>>>;
}
