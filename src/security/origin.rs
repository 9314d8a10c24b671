//! Network origin classification.
//!
//! # Responsibilities
//! - Parse dotted-quad IPv4 literals strictly (four octets, 1-3 digits each)
//! - Classify an address string as internal, gateway, external or invalid
//! - Expose the bare private-range test for callers that skip the gateway carve-out
//!
//! # Design Decisions
//! - Total function: malformed input is `Invalid`, never a panic or error
//! - Gateway suffix (`.0.1` / `.1.1`) wins over range membership, since
//!   NAT hops forward external traffic from inside private subnets
//! - No DNS, no IPv6: only literals are classified

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Where a request appears to originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkClass {
    /// Private, loopback or link-local address.
    Internal,
    /// First address of a subnet, treated as a forwarding hop.
    Gateway,
    /// Any other well-formed address.
    External,
    /// Not a dotted-quad literal.
    Invalid,
}

impl NetworkClass {
    /// Only `Internal` callers may reach internal-only routes.
    pub fn is_internal(&self) -> bool {
        matches!(self, NetworkClass::Internal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkClass::Internal => "internal",
            NetworkClass::Gateway => "gateway",
            NetworkClass::External => "external",
            NetworkClass::Invalid => "invalid",
        }
    }
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a dotted-quad literal. Each octet must be 1-3 ASCII digits in 0..=255.
pub fn parse_dotted_quad(input: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = input.trim().split('.');

    for slot in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse::<u8>().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

/// True for 10/8, 172.16/12, 192.168/16, 127/8 and 169.254/16.
pub fn is_private_range(addr: Ipv4Addr) -> bool {
    let [first, second, _, _] = addr.octets();
    first == 10
        || (first == 172 && (16..=31).contains(&second))
        || (first == 192 && second == 168)
        || first == 127
        || (first == 169 && second == 254)
}

/// Last two octets `0.1` or `1.1`.
pub fn is_gateway_address(addr: Ipv4Addr) -> bool {
    let [_, _, third, fourth] = addr.octets();
    fourth == 1 && (third == 0 || third == 1)
}

/// Classify an IP literal.
pub fn classify(ip: &str) -> NetworkClass {
    let Some(addr) = parse_dotted_quad(ip) else {
        return NetworkClass::Invalid;
    };

    if is_gateway_address(addr) {
        NetworkClass::Gateway
    } else if is_private_range(addr) {
        NetworkClass::Internal
    } else {
        NetworkClass::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table() {
        assert_eq!(classify("10.0.0.5"), NetworkClass::Internal);
        assert_eq!(classify("172.20.0.1"), NetworkClass::Gateway);
        assert_eq!(classify("172.20.0.5"), NetworkClass::Internal);
        assert_eq!(classify("8.8.8.8"), NetworkClass::External);
        assert_eq!(classify("abc"), NetworkClass::Invalid);
    }

    #[test]
    fn test_private_ranges() {
        assert_eq!(classify("192.168.4.20"), NetworkClass::Internal);
        assert_eq!(classify("127.0.0.2"), NetworkClass::Internal);
        assert_eq!(classify("169.254.169.254"), NetworkClass::Internal);
        assert_eq!(classify("172.31.255.254"), NetworkClass::Internal);
        // Outside 172.16/12
        assert_eq!(classify("172.32.0.5"), NetworkClass::External);
        assert_eq!(classify("172.15.0.5"), NetworkClass::External);
    }

    #[test]
    fn test_gateway_precedes_ranges() {
        assert_eq!(classify("192.168.1.1"), NetworkClass::Gateway);
        assert_eq!(classify("10.0.0.1"), NetworkClass::Gateway);
        assert_eq!(classify("127.0.0.1"), NetworkClass::Gateway);
        // Suffix applies to public space as well
        assert_eq!(classify("8.8.1.1"), NetworkClass::Gateway);
        // .2.1 is not a gateway suffix
        assert_eq!(classify("10.0.2.1"), NetworkClass::Internal);
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        for input in [
            "",
            "1.2.3",
            "1.2.3.4.5",
            "256.1.1.1",
            "1.2.3.-4",
            "1..3.4",
            "0001.2.3.4",
            "1.2.3.4a",
            "::1",
            "+1.2.3.4",
            "localhost",
        ] {
            assert_eq!(classify(input), NetworkClass::Invalid, "input {:?}", input);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(classify(" 10.0.0.5 "), NetworkClass::Internal);
    }

    #[test]
    fn test_every_valid_quad_maps_to_one_known_class() {
        for first in [0u8, 10, 127, 169, 172, 192, 203, 255] {
            for second in [0u8, 16, 31, 168, 254] {
                for third in [0u8, 1, 7] {
                    for fourth in [0u8, 1, 9, 255] {
                        let ip = format!("{}.{}.{}.{}", first, second, third, fourth);
                        let class = classify(&ip);
                        assert_ne!(class, NetworkClass::Invalid, "{}", ip);
                        assert_eq!(class, classify(&ip));
                    }
                }
            }
        }
    }

    #[test]
    fn test_private_range_ignores_gateway_suffix() {
        let addr = parse_dotted_quad("192.168.1.1").unwrap();
        assert!(is_private_range(addr));
        assert!(is_gateway_address(addr));
    }
}
