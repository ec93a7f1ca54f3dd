//! Community-based SNMP message format (v1/v2c).
//!
//! V1 and V2c messages share the same structure:
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! The only difference is the version number (0 for v1, 1 for v2c).

use super::{Codec, Message};
use crate::ber::{Decoder, EncodeBuf};
use crate::endpoint::Endpoint;
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;
use bytes::Bytes;

/// BER codec for community messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct BerCodec;

impl BerCodec {
    fn decode_message(&self, data: &Bytes, source: &Endpoint) -> Result<Message> {
        let mut decoder = Decoder::with_target(data.clone(), source.socket_addr());
        let mut seq = decoder.read_sequence()?;

        let version_offset = seq.offset();
        let version_num = seq.read_integer()?;
        let version = match Version::from_i32(version_num) {
            Some(Version::V3) => {
                return Err(seq.malformed(
                    version_offset,
                    DecodeErrorKind::UnsupportedVersion(version_num),
                ));
            }
            Some(version) => version,
            None => {
                return Err(seq.malformed(
                    version_offset,
                    DecodeErrorKind::UnknownVersion(version_num),
                ));
            }
        };

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        if !seq.is_empty() {
            return Err(seq.malformed(
                seq.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: seq.remaining(),
                },
            ));
        }
        if !decoder.is_empty() {
            return Err(decoder.malformed(
                decoder.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: decoder.remaining(),
                },
            ));
        }

        Ok(Message {
            version,
            community,
            pdu,
            src: Some(*source),
            dst: None,
            raw: Some(data.clone()),
        })
    }
}

impl Codec for BerCodec {
    fn decode(&self, data: &Bytes, source: &Endpoint) -> Result<Message> {
        self.decode_message(data, source)
    }

    fn encode(&self, message: &Message) -> Result<Bytes> {
        if message.version == Version::V3 {
            return Err(Error::Encode {
                kind: EncodeErrorKind::UnsupportedVersion(message.version.as_i32()),
            }
            .boxed());
        }

        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            message.pdu.encode(buf);
            buf.push_octet_string(&message.community);
            buf.push_integer(message.version.as_i32());
        });

        Ok(buf.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::PduType;
    use crate::value::Value;
    use crate::varbind::VarBind;
    use std::net::SocketAddr;

    fn source() -> Endpoint {
        Endpoint::from("10.0.0.5:161".parse::<SocketAddr>().unwrap())
    }

    fn get_request_bytes(version: Version) -> Bytes {
        let msg = Message::new(
            version,
            "public",
            Pdu::get_request(42, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]),
        );
        BerCodec.encode(&msg).unwrap()
    }

    #[test]
    fn test_decode_sets_src_and_raw() {
        let data = get_request_bytes(Version::V2c);
        let msg = BerCodec.decode(&data, &source()).unwrap();

        assert_eq!(msg.version, Version::V2c);
        assert_eq!(msg.community.as_ref(), b"public");
        assert_eq!(msg.pdu.pdu_type, PduType::GetRequest);
        assert_eq!(msg.pdu.request_id, 42);
        assert_eq!(msg.src, Some(source()));
        assert_eq!(msg.dst, None);
        assert_eq!(msg.raw.as_ref(), Some(&data));
    }

    #[test]
    fn test_v1_wire_version() {
        let data = get_request_bytes(Version::V1);
        // SEQUENCE header, then INTEGER 0
        assert_eq!(&data[2..5], &[0x02, 0x01, 0x00]);
        assert_eq!(BerCodec.decode(&data, &source()).unwrap().version, Version::V1);
    }

    #[test]
    fn test_v3_rejected_both_ways() {
        let mut data = get_request_bytes(Version::V2c).to_vec();
        data[4] = 3;
        let err = BerCodec.decode(&Bytes::from(data), &source()).unwrap_err();
        assert!(err.is_malformed());

        let msg = Message::new(Version::V3, "x", Pdu::get_request(1, &[]));
        let err = BerCodec.encode(&msg).unwrap_err();
        assert!(matches!(
            *err,
            Error::Encode {
                kind: EncodeErrorKind::UnsupportedVersion(3)
            }
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut data = get_request_bytes(Version::V2c).to_vec();
        data[4] = 2;
        assert!(BerCodec.decode(&Bytes::from(data), &source()).is_err());
    }

    #[test]
    fn test_trailing_data_rejected() {
        let mut data = get_request_bytes(Version::V2c).to_vec();
        data.extend_from_slice(&[0x00, 0x00]);
        let err = BerCodec.decode(&Bytes::from(data), &source()).unwrap_err();
        assert!(matches!(*err, Error::MalformedMessage { target } if target == source().socket_addr()));
    }

    #[test]
    fn test_empty_and_truncated_rejected() {
        assert!(BerCodec.decode(&Bytes::new(), &source()).is_err());
        let data = get_request_bytes(Version::V2c);
        for cut in [1, 5, data.len() - 1] {
            assert!(BerCodec.decode(&data.slice(..cut), &source()).is_err());
        }
    }

    #[test]
    fn test_response_roundtrip_by_value() {
        let request = BerCodec
            .decode(&get_request_bytes(Version::V2c), &source())
            .unwrap();
        let mut response = request.to_response();
        response.pdu.varbinds.push(VarBind::new(
            oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
            Value::TimeTicks(100),
        ));

        let bytes = BerCodec.encode(&response).unwrap();
        let decoded = BerCodec.decode(&bytes, &source()).unwrap();
        assert_eq!(decoded.version, response.version);
        assert_eq!(decoded.community, response.community);
        assert_eq!(decoded.pdu, response.pdu);
    }
}
