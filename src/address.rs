//! Address value types: MAC, IPv4, IPv6.

use core::fmt;
use core::str::FromStr;

use crate::no_std_prelude::Vec;

/// An error returned when parsing an address from text fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddrParseError;

impl fmt::Display for AddrParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid address syntax")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AddrParseError {}

/// A 6-byte Ethernet hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// The broadcast address `ff:ff:ff:ff:ff:ff`.
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    /// The all-zero address.
    pub const UNSPECIFIED: MacAddress = MacAddress([0; 6]);

    /// Build from six raw bytes.
    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// The address bytes, network order.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Whether this is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddress {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for slot in out.iter_mut() {
            let part = parts.next().ok_or(AddrParseError)?;
            if part.len() != 2 {
                return Err(AddrParseError);
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| AddrParseError)?;
        }
        if parts.next().is_some() {
            return Err(AddrParseError);
        }
        Ok(MacAddress(out))
    }
}

/// A 32-bit IPv4 address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ipv4Address(pub [u8; 4]);

impl Ipv4Address {
    /// `0.0.0.0`.
    pub const UNSPECIFIED: Ipv4Address = Ipv4Address([0; 4]);

    /// `255.255.255.255`.
    pub const BROADCAST: Ipv4Address = Ipv4Address([0xff; 4]);

    /// Build from four octets, most-significant first.
    pub fn new(bytes: [u8; 4]) -> Self {
        Ipv4Address(bytes)
    }

    /// Build from a host-order `u32` (as `std::net::Ipv4Addr::from` would).
    pub fn from_u32_host(value: u32) -> Self {
        Ipv4Address(value.to_be_bytes())
    }

    /// The network-order (big-endian) 32-bit representation.
    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// The host-order integer representation used when splitting the address into the two
    /// 16-bit halves a pseudo-header word needs.
    pub fn to_int(&self) -> u32 {
        self.to_u32()
    }

    /// The address bytes, network order.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Debug for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl FromStr for Ipv4Address {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 4];
        let mut parts = s.split('.');
        for slot in out.iter_mut() {
            let part = parts.next().ok_or(AddrParseError)?;
            *slot = part.parse().map_err(|_| AddrParseError)?;
        }
        if parts.next().is_some() {
            return Err(AddrParseError);
        }
        Ok(Ipv4Address(out))
    }
}

/// A 128-bit IPv6 address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ipv6Address(pub [u8; 16]);

impl Ipv6Address {
    /// `::`.
    pub const UNSPECIFIED: Ipv6Address = Ipv6Address([0; 16]);

    /// Build from sixteen raw bytes, network order.
    pub fn new(bytes: [u8; 16]) -> Self {
        Ipv6Address(bytes)
    }

    /// Build from eight 16-bit groups, most-significant first.
    pub fn from_groups(groups: [u16; 8]) -> Self {
        let mut out = [0u8; 16];
        for (chunk, group) in out.chunks_exact_mut(2).zip(groups.iter()) {
            chunk.copy_from_slice(&group.to_be_bytes());
        }
        Ipv6Address(out)
    }

    /// The eight 16-bit groups, most-significant first.
    pub fn groups(&self) -> [u16; 8] {
        let mut out = [0u16; 8];
        for (group, chunk) in out.iter_mut().zip(self.0.chunks_exact(2)) {
            *group = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        out
    }

    /// Write the 16 network-order bytes into `buf`.
    pub fn copy_to(&self, buf: &mut [u8]) {
        buf[..16].copy_from_slice(&self.0);
    }

    /// The address bytes, network order.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.groups();

        // Find the longest run of zero groups, preferring the earliest on ties, to decide where
        // `::` compression applies (RFC 5952).
        let mut best = (0usize, 0usize); // (start, len)
        let mut cur = (0usize, 0usize);
        for (i, g) in groups.iter().enumerate() {
            if *g == 0 {
                if cur.1 == 0 {
                    cur = (i, 0);
                }
                cur.1 += 1;
                if cur.1 > best.1 {
                    best = cur;
                }
            } else {
                cur = (0, 0);
            }
        }
        if best.1 < 2 {
            best = (0, 0);
        }

        let mut first = true;
        let mut i = 0;
        while i < 8 {
            if best.1 > 0 && i == best.0 {
                f.write_str("::")?;
                i += best.1;
                first = true;
                continue;
            }
            if !first {
                f.write_str(":")?;
            }
            write!(f, "{:x}", groups[i])?;
            first = false;
            i += 1;
        }
        Ok(())
    }
}

impl FromStr for Ipv6Address {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.matches("::").count() > 1 {
            return Err(AddrParseError);
        }

        let (head, tail) = match s.split_once("::") {
            Some((h, t)) => (h, Some(t)),
            None => (s, None),
        };

        let parse_groups = |text: &str| -> Result<Vec<u16>, AddrParseError> {
            if text.is_empty() {
                return Ok(Vec::new());
            }
            text.split(':')
                .map(|part| u16::from_str_radix(part, 16).map_err(|_| AddrParseError))
                .collect()
        };

        let mut groups = [0u16; 8];
        match tail {
            None => {
                let head_groups = parse_groups(head)?;
                if head_groups.len() != 8 {
                    return Err(AddrParseError);
                }
                groups.copy_from_slice(&head_groups);
            }
            Some(tail) => {
                let head_groups = parse_groups(head)?;
                let tail_groups = parse_groups(tail)?;
                if head_groups.len() + tail_groups.len() > 8 {
                    return Err(AddrParseError);
                }
                groups[..head_groups.len()].copy_from_slice(&head_groups);
                let tail_start = 8 - tail_groups.len();
                groups[tail_start..].copy_from_slice(&tail_groups);
            }
        }

        Ok(Ipv6Address::from_groups(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_round_trip() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.0, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn mac_parse_is_case_insensitive() {
        let lower: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let upper: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn ipv4_round_trip() {
        let addr: Ipv4Address = "212.199.202.9".parse().unwrap();
        assert_eq!(addr.to_string(), "212.199.202.9");
        assert_eq!(addr.to_u32(), 0xd4c7ca09);
    }

    #[test]
    fn ipv6_round_trip_with_compression() {
        let addr: Ipv6Address = "fe80::4dc7:f593:1f7b:dc11".parse().unwrap();
        assert_eq!(addr.to_string(), "fe80::4dc7:f593:1f7b:dc11");

        let mut buf = [0u8; 16];
        addr.copy_to(&mut buf);
        assert_eq!(buf, [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0x4d, 0xc7, 0xf5, 0x93, 0x1f, 0x7b, 0xdc, 0x11]);
    }

    #[test]
    fn ipv6_multicast_round_trip() {
        let addr: Ipv6Address = "ff02::c".parse().unwrap();
        assert_eq!(addr.to_string(), "ff02::c");
    }

    #[test]
    fn ipv6_unspecified() {
        let addr: Ipv6Address = "::".parse().unwrap();
        assert_eq!(addr, Ipv6Address::UNSPECIFIED);
        assert_eq!(addr.to_string(), "::");
    }
}
