//! Addressing types shared by sockets and the receive pipeline.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{Error, Result};

/// UDP address family a socket is bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// UDP over IPv4.
    Udp4,
    /// UDP over IPv6.
    Udp6,
}

impl AddressFamily {
    /// Family of a socket address.
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => Self::Udp4,
            SocketAddr::V6(_) => Self::Udp6,
        }
    }

    /// Wildcard address with an OS-assigned port.
    pub fn unspecified(self) -> SocketAddr {
        match self {
            Self::Udp4 => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            Self::Udp6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        }
    }

    /// Protocol name as used in configuration (`udp4` / `udp6`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressFamily {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "udp4" => Ok(Self::Udp4),
            "udp6" => Ok(Self::Udp6),
            other => Err(Error::Config(
                format!("unknown address family {:?}, expected udp4 or udp6", other).into(),
            )
            .boxed()),
        }
    }
}

/// Network endpoint of a message: family, address and port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub family: AddressFamily,
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    /// Build an endpoint with an explicit family.
    pub fn new(family: AddressFamily, ip: IpAddr, port: u16) -> Self {
        Self { family, ip, port }
    }

    /// Socket address of this endpoint.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            family: AddressFamily::of(&addr),
            ip: addr.ip(),
            port: addr.port(),
        }
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.socket_addr()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// One inbound datagram, as handed to the receive pipeline.
#[derive(Debug, Clone)]
pub struct RawDatagram {
    /// Payload.
    pub bytes: Bytes,
    /// Number of bytes the socket reported.
    pub len: usize,
    /// Where it came from.
    pub source: Endpoint,
}

impl RawDatagram {
    /// Wrap a received payload.
    pub fn new(bytes: Bytes, source: Endpoint) -> Self {
        Self {
            len: bytes.len(),
            bytes,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parse() {
        assert_eq!("udp4".parse::<AddressFamily>().unwrap(), AddressFamily::Udp4);
        assert_eq!("udp6".parse::<AddressFamily>().unwrap(), AddressFamily::Udp6);
        let err = "tcp".parse::<AddressFamily>().unwrap_err();
        assert!(matches!(*err, Error::Config(_)));
    }

    #[test]
    fn test_unspecified_matches_family() {
        for family in [AddressFamily::Udp4, AddressFamily::Udp6] {
            let addr = family.unspecified();
            assert_eq!(AddressFamily::of(&addr), family);
            assert_eq!(addr.port(), 0);
        }
    }

    #[test]
    fn test_endpoint_from_socket_addr() {
        let addr: SocketAddr = "10.0.0.5:161".parse().unwrap();
        let endpoint = Endpoint::from(addr);
        assert_eq!(endpoint.family, AddressFamily::Udp4);
        assert_eq!(endpoint.port, 161);
        assert_eq!(SocketAddr::from(endpoint), addr);
        assert_eq!(endpoint.to_string(), "10.0.0.5:161");

        let v6: SocketAddr = "[::1]:1161".parse().unwrap();
        assert_eq!(Endpoint::from(v6).family, AddressFamily::Udp6);
    }

    #[test]
    fn test_raw_datagram_len() {
        let source = Endpoint::from("127.0.0.1:9".parse::<SocketAddr>().unwrap());
        let raw = RawDatagram::new(Bytes::from_static(b"abc"), source);
        assert_eq!(raw.len, 3);
    }
}
