//! Response synthesis and delivery.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;

use crate::endpoint::Endpoint;
use crate::error::{EncodeErrorKind, Error, Result};
use crate::message::{Codec, Message};
use crate::transport::{DatagramSocket, SocketFactory};

/// Build and encode the response to `request`.
///
/// The encoded form is stored in the returned message's `raw` field.
pub(crate) fn build_response(codec: &dyn Codec, request: &Message) -> Result<Message> {
    let mut response = request.to_response();
    if response.dst.is_none() {
        return Err(Error::Encode {
            kind: EncodeErrorKind::MissingDestination,
        }
        .boxed());
    }
    response.raw = Some(codec.encode(&response)?);
    Ok(response)
}

/// Send an encoded response.
///
/// A supplied socket is used as-is and left open. Without one, a socket is
/// bound through `factory`, used for exactly one send, then closed. The
/// close also happens when the send fails or panics.
pub(crate) async fn send_response(
    response: &Message,
    socket: Option<&Arc<dyn DatagramSocket>>,
    factory: &dyn SocketFactory,
) -> Result<()> {
    let (Some(dst), Some(raw)) = (response.dst, response.raw.as_ref()) else {
        return Err(Error::Encode {
            kind: EncodeErrorKind::MissingDestination,
        }
        .boxed());
    };

    let (socket, ephemeral) = match socket {
        Some(socket) => (socket.clone(), false),
        None => (factory.bind(dst.family).await?, true),
    };

    // the ephemeral socket is closed even if the send panics
    let result = AssertUnwindSafe(send_once(socket.as_ref(), raw, dst))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(super::panicked(payload)));

    if ephemeral {
        socket.close().await;
    }

    result
}

async fn send_once(socket: &dyn DatagramSocket, raw: &Bytes, dst: Endpoint) -> Result<()> {
    tracing::trace!(target: "async_snmp_receiver::receiver", { snmp.target = %dst, snmp.local_addr = %socket.local_addr(), snmp.bytes = raw.len() }, "sending response");
    socket.send_to(raw, dst).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::AddressFamily;
    use crate::message::BerCodec;
    use crate::oid;
    use crate::pdu::{Pdu, PduType};
    use crate::transport::{BoxFuture, MockSocket, MockSocketFactory};
    use crate::version::Version;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> Message {
        let mut msg = Message::new(
            Version::V2c,
            "public",
            Pdu::get_request(42, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]),
        );
        msg.src = Some(Endpoint::from("10.0.0.5:161".parse::<SocketAddr>().unwrap()));
        msg
    }

    #[test]
    fn test_build_response_encodes_raw() {
        let response = build_response(&BerCodec, &request()).unwrap();
        assert_eq!(response.pdu.pdu_type, PduType::Response);
        assert_eq!(response.dst, request().src);
        let raw = response.raw.clone().unwrap();
        assert_eq!(BerCodec.encode(&response).unwrap(), raw);
    }

    #[test]
    fn test_build_response_requires_source() {
        let mut msg = request();
        msg.src = None;
        let err = build_response(&BerCodec, &msg).unwrap_err();
        assert!(matches!(
            *err,
            Error::Encode {
                kind: EncodeErrorKind::MissingDestination
            }
        ));
    }

    #[tokio::test]
    async fn test_supplied_socket_is_not_closed() {
        let factory = MockSocketFactory::new();
        let mock = Arc::new(MockSocket::new("0.0.0.0:161".parse().unwrap()));
        let socket: Arc<dyn DatagramSocket> = mock.clone();

        let response = build_response(&BerCodec, &request()).unwrap();
        send_response(&response, Some(&socket), &factory)
            .await
            .unwrap();

        assert_eq!(mock.sent().len(), 1);
        assert_eq!(mock.close_count(), 0);
        assert!(factory.created().is_empty());
    }

    #[tokio::test]
    async fn test_ephemeral_socket_closed_after_failed_send() {
        let factory = MockSocketFactory::new();
        factory.fail_sends();

        let response = build_response(&BerCodec, &request()).unwrap();
        assert!(send_response(&response, None, &factory).await.is_err());

        let created = factory.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].send_attempts(), 1);
        assert_eq!(created[0].close_count(), 1);
    }

    #[derive(Default)]
    struct PanickingSocket {
        closes: AtomicUsize,
    }

    impl DatagramSocket for PanickingSocket {
        fn send_to<'a>(&'a self, _data: &'a [u8], _target: Endpoint) -> BoxFuture<'a, Result<()>> {
            Box::pin(futures::future::lazy(|_| -> Result<()> { panic!("send bug") }))
        }

        fn close(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.closes.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn local_addr(&self) -> SocketAddr {
            "0.0.0.0:0".parse().unwrap()
        }
    }

    struct PanickingFactory(Arc<PanickingSocket>);

    impl SocketFactory for PanickingFactory {
        fn bind(&self, _family: AddressFamily) -> BoxFuture<'_, Result<Arc<dyn DatagramSocket>>> {
            let socket: Arc<dyn DatagramSocket> = self.0.clone();
            Box::pin(async move { Ok(socket) })
        }
    }

    #[tokio::test]
    async fn test_ephemeral_socket_closed_after_panicking_send() {
        let socket = Arc::new(PanickingSocket::default());
        let factory = PanickingFactory(socket.clone());

        let response = build_response(&BerCodec, &request()).unwrap();
        let err = send_response(&response, None, &factory).await.unwrap_err();

        assert!(matches!(*err, Error::Panicked(ref msg) if msg.contains("send bug")));
        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);
    }
}
