//! SNMP message envelope and the codec seam.
//!
//! A [`Message`] is the decoded form of one datagram (or the outbound
//! response built from it). The [`Codec`] trait turns bytes into messages
//! and back; [`BerCodec`] is the default implementation for SNMPv1/v2c.

mod community;

pub use community::BerCodec;

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::pdu::Pdu;
use crate::version::Version;
use bytes::Bytes;

/// Decoded SNMP message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Protocol version
    pub version: Version,
    /// Community string (carried, never checked)
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
    /// Sender, set on every decoded message.
    pub src: Option<Endpoint>,
    /// Destination, set on outbound messages.
    pub dst: Option<Endpoint>,
    /// Wire form: the received bytes, or the encoded bytes of an outbound message.
    pub raw: Option<Bytes>,
}

impl Message {
    /// Build a message with no addressing or raw form.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
            src: None,
            dst: None,
            raw: None,
        }
    }

    /// Build the response to this message.
    ///
    /// Same version and community, addressed back to the sender, with the
    /// PDU from [`Pdu::to_response`].
    pub fn to_response(&self) -> Self {
        Self {
            version: self.version,
            community: self.community.clone(),
            pdu: self.pdu.to_response(),
            src: None,
            dst: self.src,
            raw: None,
        }
    }
}

/// Encodes and decodes SNMP messages.
///
/// Implementations must be stateless across calls; the receiver shares one
/// codec between all in-flight datagrams.
pub trait Codec: Send + Sync {
    /// Decode one datagram received from `source`.
    ///
    /// The returned message has `src` set to `source` and `raw` set to `data`.
    fn decode(&self, data: &Bytes, source: &Endpoint) -> Result<Message>;

    /// Encode an outbound message.
    fn encode(&self, message: &Message) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use std::net::SocketAddr;

    #[test]
    fn test_to_response_addresses_sender() {
        let src = Endpoint::from("10.0.0.5:161".parse::<SocketAddr>().unwrap());
        let mut request = Message::new(
            Version::V2c,
            "public",
            Pdu::get_request(42, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]),
        );
        request.src = Some(src);
        request.raw = Some(Bytes::from_static(b"\x30\x00"));

        let response = request.to_response();
        assert_eq!(response.dst, Some(src));
        assert_eq!(response.src, None);
        assert_eq!(response.raw, None);
        assert_eq!(response.community, request.community);
        assert_eq!(response.version, Version::V2c);
        assert_eq!(response.pdu.request_id, 42);
    }
}
