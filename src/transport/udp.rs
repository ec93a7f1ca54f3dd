//! UDP socket implementation.

use super::{BoxFuture, DatagramSocket, SocketFactory};
use crate::endpoint::{AddressFamily, Endpoint};
use crate::error::{Error, Result};
use crate::util::bind_udp_socket;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::UdpSocket;

/// A bound tokio UDP socket.
///
/// Used both as the listening socket behind
/// [`ListeningSocket`](crate::receiver::ListeningSocket) and as the ephemeral
/// reply socket created by [`UdpSocketFactory`]. Closing drops the inner
/// socket; the descriptor is released once in-flight operations finish.
pub struct UdpEndpoint {
    socket: Mutex<Option<Arc<UdpSocket>>>,
    local_addr: SocketAddr,
}

impl UdpEndpoint {
    /// Bind to `addr`. For IPv6 addresses the socket is IPv6-only.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = bind_udp_socket(addr).map_err(|e| {
            Error::Network {
                target: addr,
                source: e,
            }
            .boxed()
        })?;

        let local_addr = socket.local_addr().map_err(|e| {
            Error::Network {
                target: addr,
                source: e,
            }
            .boxed()
        })?;

        tracing::debug!(target: "async_snmp_receiver::transport", { snmp.local_addr = %local_addr }, "UDP socket bound");

        Ok(Self {
            socket: Mutex::new(Some(Arc::new(socket))),
            local_addr,
        })
    }

    /// Address family of the bound socket.
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.local_addr)
    }

    /// Whether [`close`](DatagramSocket::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.handle().is_none()
    }

    fn handle(&self) -> Option<Arc<UdpSocket>> {
        self.socket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn closed_error(&self, target: SocketAddr) -> Box<Error> {
        Error::Network {
            target,
            source: io::Error::new(io::ErrorKind::NotConnected, "socket closed"),
        }
        .boxed()
    }

    /// Receive one datagram.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let Some(socket) = self.handle() else {
            return Err(self.closed_error(self.local_addr));
        };

        let (len, source) = socket.recv_from(buf).await.map_err(|e| {
            Error::Network {
                target: self.local_addr,
                source: e,
            }
            .boxed()
        })?;

        tracing::trace!(target: "async_snmp_receiver::transport", { snmp.source = %source, snmp.bytes = len }, "UDP recv");
        Ok((len, source))
    }

    async fn send(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        let Some(socket) = self.handle() else {
            return Err(self.closed_error(target));
        };

        tracing::trace!(target: "async_snmp_receiver::transport", { snmp.target = %target, snmp.bytes = data.len() }, "UDP send");
        socket.send_to(data, target).await.map_err(|e| {
            Error::Network { target, source: e }.boxed()
        })?;
        Ok(())
    }
}

impl DatagramSocket for UdpEndpoint {
    fn send_to<'a>(&'a self, data: &'a [u8], target: Endpoint) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.send(data, target.socket_addr()))
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let previous = self
                .socket
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if previous.is_some() {
                tracing::trace!(target: "async_snmp_receiver::transport", { snmp.local_addr = %self.local_addr }, "UDP socket closed");
            }
        })
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl std::fmt::Debug for UdpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpEndpoint")
            .field("local_addr", &self.local_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Default [`SocketFactory`]: binds a fresh [`UdpEndpoint`] on the family's
/// wildcard address.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpSocketFactory;

impl SocketFactory for UdpSocketFactory {
    fn bind(&self, family: AddressFamily) -> BoxFuture<'_, Result<Arc<dyn DatagramSocket>>> {
        Box::pin(async move {
            let endpoint = UdpEndpoint::bind(family.unspecified())?;
            Ok(Arc::new(endpoint) as Arc<dyn DatagramSocket>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let a = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let b = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap()).unwrap();

        a.send_to(b"ping", Endpoint::from(b.local_addr()))
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        let (len, source) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(source, a.local_addr());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let a = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let target = Endpoint::from(a.local_addr());
        a.close().await;
        assert!(a.is_closed());

        let err = a.send_to(b"x", target).await.unwrap_err();
        assert!(matches!(*err, Error::Network { .. }));

        // closing twice is harmless
        a.close().await;
    }

    #[tokio::test]
    async fn test_factory_binds_requested_family() {
        let socket = UdpSocketFactory.bind(AddressFamily::Udp4).await.unwrap();
        assert!(socket.local_addr().is_ipv4());
        assert_ne!(socket.local_addr().port(), 0);
        socket.close().await;
    }
}
