//! Error types for async-snmp-receiver.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type for every fallible operation
//! - [`ErrorStatus`] - SNMP protocol error codes carried in PDUs (RFC 3416)
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! Decode failures are collapsed into [`Error::MalformedMessage`]. The precise
//! reason ([`DecodeErrorKind`]) is logged at `debug` level under the
//! `async_snmp_receiver::ber` target before the error is returned.
//!
//! ```rust
//! use async_snmp_receiver::{Error, Result};
//!
//! fn handle_error(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("Success"),
//!         Err(e) => match &*e {
//!             Error::MalformedMessage { target } => {
//!                 println!("garbage from {}", target);
//!             }
//!             Error::Network { target, .. } => {
//!                 println!("socket error talking to {}", target);
//!             }
//!             _ => println!("Error: {}", e),
//!         },
//!     }
//! }
//! ```

pub(crate) mod internal;

pub use internal::{DecodeErrorKind, EncodeErrorKind};

use std::net::SocketAddr;

/// Placeholder address used when no peer is known.
///
/// Used in error contexts where the peer address cannot be determined
/// (e.g. decoding a buffer that was not attached to a datagram).
pub(crate) const UNKNOWN_TARGET: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)), 0);

// Pattern for converting detailed internal errors to simplified public errors:
//
// tracing::debug!(
//     target: "async_snmp_receiver::ber",
//     { snmp.offset = 42, kind = %DecodeErrorKind::ZeroLengthInteger },
//     "decode error details here"
// );
// return Err(Error::MalformedMessage { target }.boxed());

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The main error type for async-snmp-receiver.
///
/// Errors are boxed (via [`Result`]) to keep the size small on the stack.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Socket failure (bind, send, receive).
    #[error("network error communicating with {target}: {source}")]
    Network {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Inbound datagram could not be decoded as an SNMP message.
    #[error("malformed message from {target}")]
    MalformedMessage { target: SocketAddr },

    /// Outbound message could not be encoded.
    #[error("failed to encode message: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Failure reported by an extension hook or a message subscriber.
    #[error("message hook failed: {0}")]
    Hook(Box<str>),

    /// A panic was caught while processing a decoded message.
    #[error("panic while processing message: {0}")]
    Panicked(Box<str>),

    /// Invalid OID format.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Create a hook error from any displayable reason.
    ///
    /// Intended for [`MessageHooks`](crate::receiver::MessageHooks)
    /// implementations and message subscribers.
    pub fn hook(reason: impl std::fmt::Display) -> Box<Self> {
        Error::Hook(reason.to_string().into_boxed_str()).boxed()
    }

    /// Whether this error was produced while decoding an inbound datagram.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedMessage { .. })
    }
}

macro_rules! error_statuses {
    (
        $(#[$meta:meta])*
        pub enum ErrorStatus {
            $($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[non_exhaustive]
        pub enum ErrorStatus {
            $($(#[$doc])* $variant,)*
            /// Code outside the RFC 3416 range.
            Unknown(i32),
        }

        impl ErrorStatus {
            /// Create from raw status code.
            pub fn from_i32(value: i32) -> Self {
                match value {
                    $($code => Self::$variant,)*
                    other => {
                        tracing::warn!(target: "async_snmp_receiver::error", { snmp.error_status = other }, "unknown SNMP error status");
                        Self::Unknown(other)
                    }
                }
            }

            /// Convert to raw status code.
            pub fn as_i32(&self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => *code,
                }
            }

            /// RFC 3416 name, e.g. `noSuchName`.
            pub fn name(&self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)*
                    Self::Unknown(_) => None,
                }
            }
        }
    };
}

error_statuses! {
    /// SNMP protocol error status codes (RFC 3416).
    ///
    /// Responses synthesized by the receiver always carry [`ErrorStatus::NoError`].
    /// The other codes exist so hooks can inspect or build PDUs with real
    /// error semantics.
    ///
    /// # Example
    ///
    /// ```
    /// use async_snmp_receiver::ErrorStatus;
    ///
    /// let status = ErrorStatus::from_i32(2);
    /// assert_eq!(status, ErrorStatus::NoSuchName);
    /// assert_eq!(status.as_i32(), 2);
    /// println!("Error: {}", status); // prints "noSuchName"
    /// ```
    pub enum ErrorStatus {
        NoError = 0 => "noError",
        /// Response would not fit in one message.
        TooBig = 1 => "tooBig",
        /// SNMPv1 only.
        NoSuchName = 2 => "noSuchName",
        BadValue = 3 => "badValue",
        ReadOnly = 4 => "readOnly",
        GenErr = 5 => "genErr",
        NoAccess = 6 => "noAccess",
        WrongType = 7 => "wrongType",
        WrongLength = 8 => "wrongLength",
        WrongEncoding = 9 => "wrongEncoding",
        WrongValue = 10 => "wrongValue",
        NoCreation = 11 => "noCreation",
        InconsistentValue = 12 => "inconsistentValue",
        ResourceUnavailable = 13 => "resourceUnavailable",
        CommitFailed = 14 => "commitFailed",
        UndoFailed = 15 => "undoFailed",
        AuthorizationError = 16 => "authorizationError",
        NotWritable = 17 => "notWritable",
        InconsistentName = 18 => "inconsistentName",
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown({})", self.as_i32()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size_budget() {
        // Result<(), Box<Error>> should be pointer-sized (8 bytes on 64-bit).
        assert_eq!(
            std::mem::size_of::<Result<()>>(),
            std::mem::size_of::<*const ()>(),
            "Result<()> should be pointer-sized"
        );
    }

    #[test]
    fn test_error_status_roundtrip() {
        for code in 0..=18 {
            assert_eq!(ErrorStatus::from_i32(code).as_i32(), code);
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
    }

    #[test]
    fn test_error_status_names() {
        assert_eq!(ErrorStatus::NoSuchName.to_string(), "noSuchName");
        assert_eq!(ErrorStatus::Unknown(42).to_string(), "unknown(42)");
        assert_eq!(ErrorStatus::Unknown(42).name(), None);
    }

    #[test]
    fn test_hook_error_display() {
        let err = Error::hook("table lookup failed");
        assert_eq!(err.to_string(), "message hook failed: table lookup failed");
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_malformed_display() {
        let err = Error::MalformedMessage {
            target: "10.0.0.5:161".parse().unwrap(),
        };
        assert!(err.is_malformed());
        assert_eq!(err.to_string(), "malformed message from 10.0.0.5:161");
    }
}
