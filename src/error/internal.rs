//! Detailed error kinds.
//!
//! These are logged rather than returned: public errors stay small and the
//! precise cause lands in the trace output.

use std::fmt;

/// Reason a datagram failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Input ended before the current element.
    TruncatedData,
    /// Length field claims more bytes than are left.
    InsufficientData { needed: usize, available: usize },
    /// Indefinite length form (0x80), rejected like net-snmp does.
    IndefiniteLength,
    /// Long-form length with zero octets.
    InvalidLength,
    /// Long-form length with more than four octets.
    LengthTooLong { octets: usize },
    /// Length above the sanity limit.
    LengthExceedsMax { length: usize, max: usize },
    /// Tag differs from the expected one.
    UnexpectedTag { expected: u8, actual: u8 },
    /// INTEGER with no content octets.
    ZeroLengthInteger,
    /// INTEGER that must be taken verbatim but has more than four octets.
    IntegerTooLong { length: usize },
    /// Counter64 with more than nine content octets.
    Integer64TooLong { length: usize },
    /// NULL with content.
    InvalidNull,
    /// IpAddress that is not four octets.
    InvalidIpAddressLength { length: usize },
    /// Constructed OCTET STRING (0x24).
    ConstructedOctetString,
    /// Malformed OID subidentifier.
    InvalidOid,
    /// OID with too many arcs.
    OidTooLong { count: usize, max: usize },
    /// Unknown SNMP version number.
    UnknownVersion(i32),
    /// Version the community codec cannot handle (SNMPv3).
    UnsupportedVersion(i32),
    /// Unknown PDU tag.
    UnknownPduType(u8),
    /// SNMPv1 Trap-PDU, whose layout differs from every other PDU.
    TrapV1Layout,
    /// Bytes left over after the last expected element.
    TrailingData { remaining: usize },
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerTooLong { length } => {
                write!(f, "integer too long: {} bytes", length)
            }
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::InvalidOid => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnsupportedVersion(v) => write!(f, "unsupported SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::TrapV1Layout => write!(f, "SNMPv1 Trap-PDU layout not supported"),
            Self::TrailingData { remaining } => {
                write!(f, "{} unexpected trailing bytes", remaining)
            }
        }
    }
}

/// Reason an outbound message failed to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeErrorKind {
    /// Version the codec cannot emit.
    UnsupportedVersion(i32),
    /// Outbound message has no destination endpoint.
    MissingDestination,
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "cannot encode SNMP version {}", v),
            Self::MissingDestination => write!(f, "outbound message has no destination"),
        }
    }
}
