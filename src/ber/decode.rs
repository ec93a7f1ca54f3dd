//! BER decoding.
//!
//! Zero-copy decoding using `Bytes` to avoid allocations.

use std::net::SocketAddr;

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    target: Option<SocketAddr>,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            target: None,
        }
    }

    /// Create a decoder from bytes with a peer address for error context.
    pub fn with_target(data: Bytes, target: SocketAddr) -> Self {
        Self {
            data,
            offset: 0,
            target: Some(target),
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn target(&self) -> SocketAddr {
        self.target.unwrap_or(UNKNOWN_TARGET)
    }

    /// Log the precise decode failure and collapse it into the public error.
    pub(crate) fn malformed(&self, offset: usize, kind: DecodeErrorKind) -> Box<Error> {
        tracing::debug!(target: "async_snmp_receiver::ber", { snmp.source = %self.target(), snmp.offset = offset, kind = %kind }, "decode error");
        Error::MalformedMessage {
            target: self.target(),
        }
        .boxed()
    }

    fn child(&self, data: Bytes) -> Decoder {
        Decoder {
            data,
            offset: 0,
            target: self.target,
        }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            return Err(self.malformed(self.offset, DecodeErrorKind::TruncatedData));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Read a length field.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..])
            .map_err(|kind| self.malformed(self.offset, kind))?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let available = self.remaining();
        if len > available {
            return Err(self.malformed(
                self.offset,
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available,
                },
            ));
        }
        let start = self.offset;
        self.offset += len;
        Ok(self.data.slice(start..self.offset))
    }

    /// Read a tag, fail unless it is `expected`, and return the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let at = self.offset;
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(self.malformed(at, DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Content octets of an integer-typed value. Zero length is malformed.
    fn integer_content(&mut self, len: usize) -> Result<Bytes> {
        if len == 0 {
            return Err(self.malformed(self.offset, DecodeErrorKind::ZeroLengthInteger));
        }
        self.read_bytes(len)
    }

    /// Read an INTEGER.
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read an INTEGER whose value must survive unchanged.
    ///
    /// Unlike [`read_integer`](Self::read_integer), content longer than four
    /// octets is malformed instead of truncated.
    pub fn read_exact_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        if len > 4 {
            return Err(self.malformed(
                self.offset,
                DecodeErrorKind::IntegerTooLong { length: len },
            ));
        }
        self.read_integer_value(len)
    }

    /// Read INTEGER content of known length.
    ///
    /// Content longer than four octets keeps only its leading four, as
    /// net-snmp does.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len > 4 {
            tracing::warn!(target: "async_snmp_receiver::ber", { snmp.offset = self.offset, length = len }, "integer too long, truncating to 4 bytes");
        }
        let bytes = self.integer_content(len)?;
        let sign: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes
            .iter()
            .take(4)
            .fold(sign, |acc, &b| (acc << 8) | i32::from(b)))
    }

    /// Read Counter32/Gauge32/TimeTicks content of known length.
    ///
    /// One leading zero octet is allowed on top of four value octets.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len > 5 {
            tracing::warn!(target: "async_snmp_receiver::ber", { snmp.offset = self.offset, length = len }, "unsigned integer too long, truncating");
        }
        let bytes = self.integer_content(len)?;
        Ok(bytes
            .iter()
            .take(5)
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
    }

    /// Read Counter64 content of known length.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        // one leading zero plus eight value octets
        if len > 9 {
            return Err(self.malformed(
                self.offset,
                DecodeErrorKind::Integer64TooLong { length: len },
            ));
        }
        let bytes = self.integer_content(len)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read OBJECT IDENTIFIER content of known length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let start = self.offset;
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|kind| self.malformed(start, kind))
    }

    /// Read a SEQUENCE header and return a decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        let len = self.expect_tag(tag::universal::SEQUENCE)?;
        self.sub_decoder(len)
    }

    /// Split off the next `len` bytes as a decoder of their own.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let content = self.read_bytes(len)?;
        Ok(self.child(content))
    }
}
