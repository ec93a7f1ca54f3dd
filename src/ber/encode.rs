//! BER encoding.
//!
//! [`EncodeBuf`] fills a buffer from the back: callers push the *last*
//! element first, and constructed types wrap whatever their closure pushed.
//! This way every length is known before its header is written.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Reverse-filled BER encoding buffer.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Prepend raw bytes.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().rev());
    }

    /// Prepend a single byte.
    pub fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Prepend a tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.push_byte(tag);
    }

    /// Prepend a length field.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, n) = encode_length(len);
        // encode_length already returns the bytes reversed
        self.buf.extend_from_slice(&bytes[..n]);
    }

    /// Prepend a constructed element whose content is produced by `f`.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let before = self.buf.len();
        f(self);
        let content_len = self.buf.len() - before;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Prepend a SEQUENCE whose content is produced by `f`.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Prepend a signed INTEGER in minimal two's complement form.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        while start < 3 {
            let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.push_bytes(&bytes[start..]);
        self.push_length(4 - start);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Prepend an unsigned 32-bit value with an application tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        self.push_unsigned(tag, &value.to_be_bytes());
    }

    /// Prepend a Counter64.
    pub fn push_integer64(&mut self, value: u64) {
        self.push_unsigned(tag::application::COUNTER64, &value.to_be_bytes());
    }

    fn push_unsigned(&mut self, tag: u8, bytes: &[u8]) {
        let first = bytes
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(bytes.len() - 1);
        let content = &bytes[first..];
        // Leading zero keeps the value positive
        if content[0] & 0x80 != 0 {
            self.push_bytes(content);
            self.push_byte(0x00);
            self.push_length(content.len() + 1);
        } else {
            self.push_bytes(content);
            self.push_length(content.len());
        }
        self.push_tag(tag);
    }

    /// Prepend an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Prepend a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Prepend an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        let content = oid.ber_content();
        self.push_bytes(&content);
        self.push_length(content.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Prepend an IpAddress.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Finish encoding and return the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::Decoder;

    fn encode_int(v: i32) -> Vec<u8> {
        let mut buf = EncodeBuf::new();
        buf.push_integer(v);
        buf.finish().to_vec()
    }

    #[test]
    fn test_integer_minimal() {
        assert_eq!(encode_int(0), vec![0x02, 0x01, 0x00]);
        assert_eq!(encode_int(127), vec![0x02, 0x01, 0x7F]);
        assert_eq!(encode_int(128), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(encode_int(-1), vec![0x02, 0x01, 0xFF]);
        assert_eq!(encode_int(-129), vec![0x02, 0x02, 0xFF, 0x7F]);
        assert_eq!(encode_int(42), vec![0x02, 0x01, 0x2A]);
    }

    #[test]
    fn test_integer_extremes_decode() {
        for v in [i32::MIN, i32::MAX, -128, 255, 65535] {
            let mut dec = Decoder::new(Bytes::from(encode_int(v)));
            assert_eq!(dec.read_integer().unwrap(), v);
        }
    }

    #[test]
    fn test_unsigned_leading_zero() {
        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::COUNTER32, 0x80);
        assert_eq!(buf.finish().as_ref(), &[0x41, 0x02, 0x00, 0x80]);

        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::GAUGE32, 0);
        assert_eq!(buf.finish().as_ref(), &[0x42, 0x01, 0x00]);
    }

    #[test]
    fn test_sequence_wraps_content() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_integer(2);
            buf.push_integer(1);
        });
        assert_eq!(
            buf.finish().as_ref(),
            &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn test_octet_string_and_null() {
        let mut buf = EncodeBuf::new();
        buf.push_null();
        buf.push_octet_string(b"public");
        assert_eq!(
            buf.finish().as_ref(),
            &[0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0x05, 0x00]
        );
    }

    #[test]
    fn test_long_content_uses_long_form_length() {
        let data = vec![0xAB; 200];
        let mut buf = EncodeBuf::new();
        buf.push_octet_string(&data);
        let encoded = buf.finish();
        assert_eq!(&encoded[..3], &[0x04, 0x81, 200]);
        assert_eq!(encoded.len(), 203);
    }
}
