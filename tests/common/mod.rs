//! Shared test infrastructure for async-snmp-receiver.
//!
//! Provides TestReceiver (in-process receiver on a loopback port), request
//! fixtures and a small UDP client.

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod receiver;

pub use fixtures::{get_request, set_request, sys_descr, sys_name};
pub use receiver::{TestReceiver, TestReceiverBuilder};

use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// How long tests wait for something that should happen.
pub const WAIT: Duration = Duration::from_secs(2);

/// How long tests wait for something that should not happen.
pub const QUIET: Duration = Duration::from_millis(200);

/// Bind a client socket on an ephemeral loopback port.
pub async fn client() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Receive one datagram, or `None` if nothing arrives within `within`.
pub async fn recv_within(socket: &UdpSocket, within: Duration) -> Option<(Bytes, SocketAddr)> {
    let mut buf = vec![0u8; 65535];
    match tokio::time::timeout(within, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, from))) => Some((Bytes::copy_from_slice(&buf[..len]), from)),
        _ => None,
    }
}
