//! SNMP value types.
//!
//! The `Value` enum carries every varbind payload a receiver may see,
//! including the SNMPv2 exception markers.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::DecodeErrorKind;
use crate::error::Result;
use crate::oid::Oid;
use bytes::Bytes;

/// SNMP value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes).
    ///
    /// The SMIv2 limit of 65535 octets is not enforced while decoding.
    OctetString(Bytes),

    /// NULL
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32
    Gauge32(u32),

    /// TimeTicks (hundredths of seconds)
    TimeTicks(u32),

    /// Opaque (legacy, arbitrary bytes)
    Opaque(Bytes),

    /// Counter64 (SNMPv2c only)
    Counter64(u64),

    /// noSuchObject exception
    NoSuchObject,

    /// noSuchInstance exception
    NoSuchInstance,

    /// endOfMibView exception
    EndOfMibView,

    /// Unrecognized tag, kept verbatim so it can be echoed back
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// OctetString content as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    /// Raw content of an OctetString or Opaque.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric content of any integer-typed value, widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(v) => Some(i64::from(v)),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(i64::from(v)),
            Value::Counter64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Whether this is one of the SNMPv2 exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        use tag::{application as app, context as ctx};

        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(app::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(app::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(app::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::Opaque(data) => push_primitive(buf, app::OPAQUE, data),
            Value::NoSuchObject => push_primitive(buf, ctx::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => push_primitive(buf, ctx::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => push_primitive(buf, ctx::END_OF_MIB_VIEW, &[]),
            Value::Unknown { tag, data } => push_primitive(buf, *tag, data),
        }
    }

    /// Decode from BER.
    ///
    /// Unrecognized primitive tags decode to [`Value::Unknown`] so they can
    /// be echoed back unchanged.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        use tag::{application as app, context as ctx, universal as uni};

        let offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        let value = match tag {
            uni::INTEGER => Value::Integer(decoder.read_integer_value(len)?),
            uni::NULL if len == 0 => Value::Null,
            uni::NULL => return Err(decoder.malformed(offset, DecodeErrorKind::InvalidNull)),
            uni::OBJECT_IDENTIFIER => Value::ObjectIdentifier(decoder.read_oid_value(len)?),
            uni::OCTET_STRING_CONSTRUCTED => {
                return Err(decoder.malformed(offset, DecodeErrorKind::ConstructedOctetString));
            }
            app::IP_ADDRESS => {
                if len != 4 {
                    return Err(decoder.malformed(
                        offset,
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Value::IpAddress([data[0], data[1], data[2], data[3]])
            }
            app::COUNTER32 => Value::Counter32(decoder.read_unsigned32_value(len)?),
            app::GAUGE32 => Value::Gauge32(decoder.read_unsigned32_value(len)?),
            app::TIMETICKS => Value::TimeTicks(decoder.read_unsigned32_value(len)?),
            app::COUNTER64 => Value::Counter64(decoder.read_integer64_value(len)?),
            _ => {
                // everything left is carried as opaque content
                let data = decoder.read_bytes(len)?;
                match tag {
                    uni::OCTET_STRING => Value::OctetString(data),
                    app::OPAQUE => Value::Opaque(data),
                    ctx::NO_SUCH_OBJECT => Value::NoSuchObject,
                    ctx::NO_SUCH_INSTANCE => Value::NoSuchInstance,
                    ctx::END_OF_MIB_VIEW => Value::EndOfMibView,
                    _ => Value::Unknown { tag, data },
                }
            }
        };
        Ok(value)
    }
}

fn push_primitive(buf: &mut EncodeBuf, tag: u8, data: &[u8]) {
    buf.push_bytes(data);
    buf.push_length(data.len());
    buf.push_tag(tag);
}

struct Hex<'a>(&'a [u8]);

impl std::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("0x")?;
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => f.write_str(s),
                Err(_) => write!(f, "{}", Hex(data)),
            },
            Value::Null => f.write_str("NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => write!(f, "{}", std::net::Ipv4Addr::from(*addr)),
            Value::Counter32(v) => write!(f, "Counter32: {}", v),
            Value::Gauge32(v) => write!(f, "Gauge32: {}", v),
            Value::TimeTicks(v) => write!(f, "Timeticks: ({})", v),
            Value::Counter64(v) => write!(f, "Counter64: {}", v),
            Value::Opaque(data) => write!(f, "Opaque: {}", Hex(data)),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
            Value::Unknown { tag, data } => write!(f, "[tag 0x{:02X}] {}", tag, Hex(data)),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &'static [u8]) -> Result<Value> {
        Value::decode(&mut Decoder::new(Bytes::from_static(data)))
    }

    fn encode(value: &Value) -> Bytes {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        buf.finish()
    }

    #[test]
    fn test_reject_constructed_octet_string() {
        assert!(decode(&[0x24, 0x03, 0x04, 0x01, 0x41]).is_err());
    }

    #[test]
    fn test_primitive_octet_string_accepted() {
        let value = decode(&[0x04, 0x03, 0x41, 0x42, 0x43]).unwrap();
        assert_eq!(value.as_str(), Some("ABC"));
    }

    #[test]
    fn test_null_with_content_rejected() {
        assert!(decode(&[0x05, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_ip_address_wrong_length_rejected() {
        assert!(decode(&[0x40, 0x03, 10, 0, 0]).is_err());
    }

    #[test]
    fn test_counter64_large() {
        let value = Value::Counter64(u64::MAX);
        let encoded = encode(&value);
        // tag, length, leading zero, 8 value bytes
        assert_eq!(encoded.len(), 11);
        assert_eq!(
            Value::decode(&mut Decoder::new(encoded)).unwrap(),
            value
        );
    }

    #[test]
    fn test_exceptions_encode_empty() {
        assert_eq!(encode(&Value::NoSuchObject).as_ref(), &[0x80, 0x00]);
        assert_eq!(encode(&Value::NoSuchInstance).as_ref(), &[0x81, 0x00]);
        assert_eq!(encode(&Value::EndOfMibView).as_ref(), &[0x82, 0x00]);
        assert!(Value::EndOfMibView.is_exception());
        assert!(!Value::Null.is_exception());
    }

    #[test]
    fn test_unknown_tag_preserved() {
        let value = decode(&[0x47, 0x02, 0xAA, 0xBB]).unwrap();
        assert_eq!(
            value,
            Value::Unknown {
                tag: 0x47,
                data: Bytes::from_static(&[0xAA, 0xBB])
            }
        );
        assert_eq!(encode(&value).as_ref(), &[0x47, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-5).to_string(), "-5");
        assert_eq!(Value::from("hello").to_string(), "hello");
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[0xff, 0x00])).to_string(),
            "0xff00"
        );
        assert_eq!(Value::IpAddress([10, 0, 0, 5]).to_string(), "10.0.0.5");
        assert_eq!(Value::TimeTicks(360_000).to_string(), "Timeticks: (360000)");
        assert_eq!(
            Value::Unknown {
                tag: 0x47,
                data: Bytes::from_static(&[0xAB])
            }
            .to_string(),
            "[tag 0x47] 0xab"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Gauge32(7).as_i64(), Some(7));
        assert_eq!(Value::Integer(-1).as_i64(), Some(-1));
        assert_eq!(Value::Counter64(u64::MAX).as_i64(), None);
        assert_eq!(Value::Null.as_i64(), None);
        assert_eq!(
            Value::Opaque(Bytes::from_static(b"x")).as_bytes(),
            Some(&b"x"[..])
        );
    }
}
