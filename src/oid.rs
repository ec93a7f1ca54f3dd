//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.

use crate::error::{DecodeErrorKind, Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
/// Enforced during BER decoding.
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_receiver::oid::Oid;
    ///
    /// let oid = Oid::new(vec![1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// Arc constraints (X.690 Section 8.19.4) are not checked here.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_receiver::oid::Oid;
    ///
    /// let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.len(), 9);
    /// assert!(Oid::parse("1.3.x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }

            let arc: u32 = part
                .parse()
                .map_err(|_| Error::InvalidOid(format!("invalid arc in {:?}", s).into()).boxed())?;

            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// BER content octets (X.690 Section 8.19).
    ///
    /// The first two arcs share one subidentifier, `arc1 * 40 + arc2`. A
    /// single-arc OID encodes as `arc1 * 40`; an empty OID as nothing.
    pub fn ber_content(&self) -> SmallVec<[u8; 64]> {
        let mut out = SmallVec::new();
        let (first, rest) = match self.arcs.as_slice() {
            [] => return out,
            [a] => (a.saturating_mul(40), &[][..]),
            [a, b, rest @ ..] => (a.saturating_mul(40).saturating_add(*b), rest),
        };

        for subid in std::iter::once(first).chain(rest.iter().copied()) {
            push_base128(&mut out, subid);
        }
        out
    }

    /// Decode BER content octets.
    ///
    /// Returns the precise failure reason; the BER decoder turns it into
    /// a public error with peer context.
    pub fn from_ber(data: &[u8]) -> std::result::Result<Self, DecodeErrorKind> {
        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut rest = data;

        while !rest.is_empty() {
            let (subid, used) = read_base128(rest)?;
            rest = &rest[used..];

            if arcs.is_empty() {
                let arc1 = (subid / 40).min(2);
                arcs.push(arc1);
                arcs.push(subid - arc1 * 40);
            } else {
                arcs.push(subid);
            }

            if arcs.len() > MAX_OID_LEN {
                return Err(DecodeErrorKind::OidTooLong {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                });
            }
        }

        Ok(Self { arcs })
    }
}

fn push_base128(out: &mut SmallVec<[u8; 64]>, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let byte = ((value >> (i * 7)) & 0x7F) as u8;
        out.push(if i > 0 { byte | 0x80 } else { byte });
    }
}

/// Read one subidentifier, returning (value, bytes consumed).
fn read_base128(data: &[u8]) -> std::result::Result<(u32, usize), DecodeErrorKind> {
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(DecodeErrorKind::InvalidOid);
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DecodeErrorKind::TruncatedData)
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use async_snmp_receiver::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
