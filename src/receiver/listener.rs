//! Listening sockets and their receive loops.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::Receiver;
use crate::endpoint::{Endpoint, RawDatagram};
use crate::transport::{DatagramSocket, UdpEndpoint};

/// Largest UDP payload we accept.
const MAX_DATAGRAM: usize = 65535;

/// A bound UDP socket feeding a [`Receiver`].
///
/// Created by [`Receiver::create_socket`]. Every datagram received is
/// processed on its own task and answered through this socket. The caller
/// owns the socket: the receiver never closes it. Dropping the handle leaves
/// the loop running until the receiver is shut down.
#[derive(Debug)]
pub struct ListeningSocket {
    socket: Arc<UdpEndpoint>,
    endpoint: Endpoint,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListeningSocket {
    pub(super) fn spawn(
        receiver: Receiver,
        socket: Arc<UdpEndpoint>,
        cancel: CancellationToken,
    ) -> Self {
        let endpoint = Endpoint::from(socket.local_addr());
        let task = tokio::spawn(recv_loop(receiver, socket.clone(), cancel.clone()));
        Self {
            socket,
            endpoint,
            cancel,
            task,
        }
    }

    /// Bound address, with the OS-assigned port filled in.
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.socket_addr()
    }

    /// Bound address as an [`Endpoint`].
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The underlying socket.
    pub fn socket(&self) -> Arc<UdpEndpoint> {
        self.socket.clone()
    }

    /// Stop the receive loop and close the socket.
    ///
    /// Datagrams already handed to the pipeline finish processing; their
    /// replies fail once the socket is gone.
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(target: "async_snmp_receiver::receiver", { snmp.local_addr = %self.endpoint, error = %e }, "receive loop ended abnormally");
        }
        self.socket.close().await;
    }
}

#[instrument(skip_all, fields(receiver = %receiver.name(), snmp.local_addr = %socket.local_addr()))]
async fn recv_loop(receiver: Receiver, socket: Arc<UdpEndpoint>, cancel: CancellationToken) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let family = socket.family();
    let reply: Arc<dyn DatagramSocket> = socket.clone();

    tracing::debug!(target: "async_snmp_receiver::receiver", "receive loop started");

    loop {
        let (len, source) = tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    if socket.is_closed() {
                        break;
                    }
                    tracing::warn!(target: "async_snmp_receiver::receiver", { error = %e }, "recv error");
                    continue;
                }
            },
            _ = cancel.cancelled() => break,
        };

        let raw = RawDatagram::new(
            Bytes::copy_from_slice(&buf[..len]),
            Endpoint::new(family, source.ip(), source.port()),
        );
        let receiver = receiver.clone();
        let reply = reply.clone();
        tokio::spawn(async move {
            receiver.on_datagram(raw, Some(reply)).await;
        });
    }

    tracing::debug!(target: "async_snmp_receiver::receiver", "receive loop stopped");
}
