//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): Rejected per net-snmp behavior

use crate::error::DecodeErrorKind;

/// Maximum length we'll accept (to prevent DoS).
///
/// A UDP datagram cannot exceed 64KB, so anything larger is a lie.
pub const MAX_LENGTH: usize = 0x10000;

/// Encode a length field, least significant octet first, ready to be
/// prepended to a reverse buffer.
///
/// Short form up to 127, long form with up to four length octets above.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    if len <= 0x7F {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let octets = ((usize::BITS - len.leading_zeros()).div_ceil(8) as usize).min(4);
    for (i, slot) in buf.iter_mut().take(octets).enumerate() {
        *slot = (len >> (8 * i)) as u8;
    }
    buf[octets] = 0x80 | octets as u8;
    (buf, octets + 1)
}

/// Decode a length from bytes, returning (length, bytes_consumed).
pub fn decode_length(data: &[u8]) -> Result<(usize, usize), DecodeErrorKind> {
    let Some(&first) = data.first() else {
        return Err(DecodeErrorKind::TruncatedData);
    };

    if first == 0x80 {
        return Err(DecodeErrorKind::IndefiniteLength);
    }

    if first & 0x80 == 0 {
        return Ok((usize::from(first), 1));
    }

    let octets = usize::from(first & 0x7F);
    match octets {
        0 => return Err(DecodeErrorKind::InvalidLength),
        5.. => return Err(DecodeErrorKind::LengthTooLong { octets }),
        _ => {}
    }

    let Some(field) = data.get(1..=octets) else {
        return Err(DecodeErrorKind::TruncatedData);
    };
    let len = field.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));

    if len > MAX_LENGTH {
        return Err(DecodeErrorKind::LengthExceedsMax {
            length: len,
            max: MAX_LENGTH,
        });
    }

    Ok((len, 1 + octets))
}
