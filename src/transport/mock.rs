//! Mock sockets for testing.
//!
//! Record what the pipeline sends and when it closes sockets, without
//! touching the network.

use super::{BoxFuture, DatagramSocket, SocketFactory};
use crate::endpoint::{AddressFamily, Endpoint};
use crate::error::{Error, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A datagram recorded by [`MockSocket`].
#[derive(Clone, Debug, PartialEq)]
pub struct SentDatagram {
    /// Payload as passed to `send_to`
    pub data: Bytes,
    /// Destination
    pub target: Endpoint,
}

/// Socket that records sends and closes.
#[derive(Debug)]
pub struct MockSocket {
    local_addr: SocketAddr,
    sent: Mutex<Vec<SentDatagram>>,
    attempts: AtomicUsize,
    closes: AtomicUsize,
    fail_sends: AtomicBool,
}

impl MockSocket {
    /// Create a mock socket reporting `local_addr`.
    pub fn new(local_addr: SocketAddr) -> Self {
        Self {
            local_addr,
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Make every subsequent send fail with a network error.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::Relaxed);
    }

    /// Datagrams sent successfully, in order. Failed sends are not listed.
    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send attempts, including failed ones.
    pub fn send_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

impl DatagramSocket for MockSocket {
    fn send_to<'a>(&'a self, data: &'a [u8], target: Endpoint) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            if self.fail_sends.load(Ordering::Relaxed) {
                return Err(Error::Network {
                    target: target.socket_addr(),
                    source: std::io::Error::other("mock send failure"),
                }
                .boxed());
            }
            self.sent.lock().unwrap().push(SentDatagram {
                data: Bytes::copy_from_slice(data),
                target,
            });
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::Relaxed);
        })
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Factory handing out [`MockSocket`]s and remembering each one.
#[derive(Debug, Default)]
pub struct MockSocketFactory {
    created: Mutex<Vec<Arc<MockSocket>>>,
    fail_sends: AtomicBool,
    fail_binds: AtomicBool,
}

impl MockSocketFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets created from now on fail every send.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::Relaxed);
    }

    /// Every subsequent bind fails.
    pub fn fail_binds(&self) {
        self.fail_binds.store(true, Ordering::Relaxed);
    }

    /// Sockets created so far, in order.
    pub fn created(&self) -> Vec<Arc<MockSocket>> {
        self.created.lock().unwrap().clone()
    }
}

impl SocketFactory for MockSocketFactory {
    fn bind(&self, family: AddressFamily) -> BoxFuture<'_, Result<Arc<dyn DatagramSocket>>> {
        Box::pin(async move {
            let addr = family.unspecified();
            if self.fail_binds.load(Ordering::Relaxed) {
                return Err(Error::Network {
                    target: addr,
                    source: std::io::Error::other("mock bind failure"),
                }
                .boxed());
            }

            let socket = Arc::new(MockSocket::new(addr));
            if self.fail_sends.load(Ordering::Relaxed) {
                socket.fail_sends();
            }
            self.created.lock().unwrap().push(socket.clone());
            Ok(socket as Arc<dyn DatagramSocket>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_send_is_recorded() {
        let socket = MockSocket::new("127.0.0.1:1".parse().unwrap());
        socket.fail_sends();
        let target = Endpoint::from("127.0.0.1:2".parse::<SocketAddr>().unwrap());
        assert!(socket.send_to(b"x", target).await.is_err());
        assert_eq!(socket.send_attempts(), 1);
        assert!(socket.sent().is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_is_listed() {
        let socket = MockSocket::new("127.0.0.1:1".parse().unwrap());
        let target = Endpoint::from("127.0.0.1:2".parse::<SocketAddr>().unwrap());
        socket.send_to(b"ok", target).await.unwrap();
        assert_eq!(socket.send_attempts(), 1);
        assert_eq!(
            socket.sent(),
            vec![SentDatagram {
                data: Bytes::from_static(b"ok"),
                target,
            }]
        );
    }

    #[tokio::test]
    async fn test_factory_tracks_sockets() {
        let factory = MockSocketFactory::new();
        let socket = factory.bind(AddressFamily::Udp6).await.unwrap();
        assert!(socket.local_addr().is_ipv6());
        socket.close().await;

        let created = factory.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].close_count(), 1);

        factory.fail_binds();
        assert!(factory.bind(AddressFamily::Udp4).await.is_err());
    }
}
