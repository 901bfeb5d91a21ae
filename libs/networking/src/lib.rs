//! Networking helpers for pre-flight validation.
//!
//! This library provides:
//! - CIDR parsing for IPv4 and IPv6 networks
//! - Containment and overlap checks between networks
//!
//! The topology validators use these to make sure the machine networks of
//! a new cluster do not collide with networks already attached to the
//! workspace's cloud connections.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Networking errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Invalid IP address.
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// Invalid CIDR prefix.
    #[error("invalid CIDR prefix: {0}")]
    InvalidPrefix(String),
}

// ============================================================================
// CIDR
// ============================================================================

/// An IP network in CIDR notation, masked to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    addr: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    /// Create a network, masking `addr` to `prefix_len` bits.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, NetworkError> {
        let max = max_prefix(&addr);
        if prefix_len > max {
            return Err(NetworkError::InvalidPrefix(format!(
                "prefix length {} exceeds {}",
                prefix_len, max
            )));
        }

        Ok(Self {
            addr: mask(addr, prefix_len),
            prefix_len,
        })
    }

    /// Network address.
    pub fn network(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Check if an address is within this network.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.addr, addr) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask(addr, self.prefix_len) == self.addr
            }
            _ => false,
        }
    }

    /// Two networks overlap when either contains the other's network
    /// address. Networks of different families never overlap.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.contains(other.addr) || other.contains(self.addr)
    }
}

impl FromStr for Cidr {
    type Err = NetworkError;

    /// Parse from CIDR notation (e.g. `192.168.0.0/24`, `2001:db8::/32`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((addr_str, prefix_str)) = s.trim().split_once('/') else {
            return Err(NetworkError::InvalidPrefix(format!(
                "missing '/' in CIDR: {}",
                s
            )));
        };

        let addr = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidPrefix(prefix_str.to_string()))?;

        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Mask an address to a prefix length.
fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = if prefix_len == 0 {
                0
            } else if prefix_len >= 32 {
                u32::MAX
            } else {
                u32::MAX << (32 - prefix_len)
            };
            IpAddr::V4(Ipv4Addr::from(bits & mask))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from_be_bytes(v6.octets());
            let mask = if prefix_len == 0 {
                0
            } else if prefix_len >= 128 {
                u128::MAX
            } else {
                u128::MAX << (128 - prefix_len)
            };
            IpAddr::V6(Ipv6Addr::from((bits & mask).to_be_bytes()))
        }
    }
}

/// Find the first `(existing, candidate)` pair that overlaps.
pub fn first_conflict<'a>(
    existing: impl IntoIterator<Item = &'a Cidr>,
    candidates: &'a [Cidr],
) -> Option<(Cidr, Cidr)> {
    existing.into_iter().find_map(|e| {
        candidates
            .iter()
            .find(|c| e.overlaps(c))
            .map(|c| (*e, *c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cidr(s: &str) -> Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let net = cidr("192.168.10.77/24");
        assert_eq!(net.to_string(), "192.168.10.0/24");

        let net = cidr("2001:db8::1/32");
        assert_eq!(net.to_string(), "2001:db8::/32");
    }

    #[rstest]
    #[case("10.0.0.0")]
    #[case("10.0.0.0/33")]
    #[case("10.0.0/8")]
    #[case("2001:db8::/129")]
    #[case("10.0.0.0/x")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(input.parse::<Cidr>().is_err());
    }

    #[test]
    fn test_contains() {
        let net = cidr("10.0.0.0/16");
        assert!(net.contains("10.0.255.1".parse().unwrap()));
        assert!(!net.contains("10.1.0.1".parse().unwrap()));
        assert!(!net.contains("::1".parse().unwrap()));
    }

    #[rstest]
    #[case("10.0.0.0/16", "10.0.5.0/24", true)]
    #[case("10.0.5.0/24", "10.0.0.0/16", true)]
    #[case("10.0.0.0/24", "10.0.1.0/24", false)]
    #[case("192.168.0.0/24", "192.168.0.0/24", true)]
    #[case("0.0.0.0/0", "172.16.0.0/12", true)]
    #[case("10.0.0.0/8", "fd00::/8", false)]
    #[case("2001:db8::/32", "2001:db8:1::/48", true)]
    fn test_overlaps(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(cidr(a).overlaps(&cidr(b)), expected);
    }

    #[test]
    fn test_first_conflict() {
        let existing = [cidr("10.0.0.0/24"), cidr("192.168.0.0/16")];
        let candidates = [cidr("172.16.0.0/16"), cidr("192.168.140.0/24")];

        assert_eq!(
            first_conflict(&existing, &candidates),
            Some((cidr("192.168.0.0/16"), cidr("192.168.140.0/24")))
        );
        assert_eq!(first_conflict(&existing[..1], &candidates), None);
    }
}
