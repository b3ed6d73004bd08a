//! UDP: an 8-byte header, checksummed against a pseudo-header borrowed from the IP layer below.

use byteorder::{BigEndian, ByteOrder};

use crate::checksum::internet_checksum;
use crate::no_std_prelude::Vec;
use crate::wire::ipv4::Ipv4Frame;
use crate::wire::ipv6::Ipv6Frame;

/// Byte length of the UDP header.
pub const HEADER_LEN: usize = 8;

const SRC_PORT: core::ops::Range<usize> = 0..2;
const DST_PORT: core::ops::Range<usize> = 2..4;
const LENGTH: core::ops::Range<usize> = 4..6;
const CHECKSUM: core::ops::Range<usize> = 6..8;

/// IP protocol number for UDP, used in both the IPv4 and IPv6 pseudo-headers.
const PROTO_UDP: u8 = 17;

/// A read/write view of a UDP header over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct UdpFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> UdpFrame<T> {
    /// Wrap `buffer`, which must be at least [`HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        UdpFrame { buffer }
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Source port.
    pub fn src_port(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[SRC_PORT])
    }

    /// Destination port.
    pub fn dst_port(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[DST_PORT])
    }

    /// Length field (header + data), host order.
    pub fn length(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[LENGTH])
    }

    /// Checksum field as stored (not recomputed).
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[CHECKSUM])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> UdpFrame<T> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    /// Set the source port.
    pub fn set_src_port(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[SRC_PORT], value);
    }

    /// Set the destination port.
    pub fn set_dst_port(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[DST_PORT], value);
    }

    /// Set the length field.
    pub fn set_length(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[LENGTH], value);
    }

    /// Set the checksum field.
    pub fn set_checksum(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[CHECKSUM], value);
    }
}

/// Build a detached UDP header's bytes (8 bytes, no payload — the payload is a separate layer).
pub fn build(src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_LEN];
    let mut frame = UdpFrame::new(&mut bytes[..]);
    frame.set_src_port(src_port);
    frame.set_dst_port(dst_port);
    bytes
}

/// UDP has no next-protocol field; any residual bytes are always opaque `Payload`.
pub(crate) fn parse_step(remaining: &[u8]) -> super::ParseOutcome {
    if remaining.len() < HEADER_LEN {
        return super::ParseOutcome::Truncated;
    }
    super::ParseOutcome::Continue {
        local_len: HEADER_LEN,
        next: crate::tag::ProtocolTag::Payload,
    }
}

/// The pseudo-header bytes prepended to the checksum calculation, one shape per IP version.
pub(crate) enum PseudoHeader<'a> {
    /// `(ipv4_header, this layer's length)` — built from the IPv4 previous layer's
    /// source/destination, per `original_source/Packet++/src/UdpLayer.cpp`.
    V4 { ip: Ipv4Frame<&'a [u8]>, udp_length: u16 },
    /// `(ipv6_header, this layer's length)`.
    V6 { ip: Ipv6Frame<&'a [u8]>, udp_length: u16 },
}

/// Recompute `length` and `checksum` given the bytes of this layer plus everything after it
/// (`segment`, which starts with the UDP header) and the IP pseudo-header from the layer below.
///
/// Per the resolved Open Question (a), the checksum is always recomputed and written; per (b), a
/// computed zero is transmitted as `0xffff`.
pub(crate) fn compute_fields(segment: &mut [u8], pseudo: Option<PseudoHeader<'_>>) {
    let total_len = segment.len() as u16;
    {
        let mut frame = UdpFrame::new(&mut *segment);
        frame.set_length(total_len);
        frame.set_checksum(0);
    }

    let pseudo = match pseudo {
        Some(pseudo) => pseudo,
        None => return,
    };

    let checksum = match pseudo {
        PseudoHeader::V4 { ip, udp_length } => {
            let src = ip.src_addr().to_int();
            let dst = ip.dst_addr().to_int();
            let header = [
                (src >> 16) as u16,
                src as u16,
                (dst >> 16) as u16,
                dst as u16,
                PROTO_UDP as u16,
                udp_length,
            ];
            let mut header_bytes = [0u8; 12];
            for (chunk, word) in header_bytes.chunks_exact_mut(2).zip(header.iter()) {
                BigEndian::write_u16(chunk, *word);
            }
            internet_checksum(&[&header_bytes, segment])
        }
        PseudoHeader::V6 { ip, udp_length } => {
            let mut header_bytes = [0u8; 40];
            ip.src_addr().copy_to(&mut header_bytes[0..16]);
            ip.dst_addr().copy_to(&mut header_bytes[16..32]);
            BigEndian::write_u32(&mut header_bytes[32..36], udp_length as u32);
            header_bytes[39] = PROTO_UDP;
            internet_checksum(&[&header_bytes, segment])
        }
    };

    UdpFrame::new(segment).set_checksum(checksum_or_all_ones(checksum));
}

/// RFC 768: a computed checksum of zero is transmitted as all-ones, since a literal zero means
/// "no checksum was computed" and is only ever legal there for IPv4.
pub(crate) fn checksum_or_all_ones(checksum: u16) -> u16 {
    if checksum == 0 {
        0xffff
    } else {
        checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Ipv4Address;
    use crate::wire::ipv4;

    #[test]
    fn build_sets_ports() {
        let bytes = build(63628, 1900);
        let frame = UdpFrame::new(&bytes[..]);
        assert_eq!(frame.src_port(), 63628);
        assert_eq!(frame.dst_port(), 1900);
    }

    #[test]
    fn compute_fields_over_ipv4_preserves_valid_checksum() {
        // A captured UDP/IPv4 datagram's checksum must be reproduced exactly by recomputation.
        let ip_bytes = ipv4::build(
            "10.0.0.6".parse().unwrap(),
            "10.0.0.7".parse::<Ipv4Address>().unwrap(),
            1,
            0,
            64,
            PROTO_UDP,
            &[],
        );
        let mut segment = build(5000, 6000);
        segment.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
        let expected_len = segment.len() as u16;

        let pseudo = PseudoHeader::V4 {
            ip: Ipv4Frame::new(&ip_bytes[..]),
            udp_length: expected_len,
        };
        compute_fields(&mut segment, Some(pseudo));
        let checksum_first = UdpFrame::new(&segment[..]).checksum();

        // Recomputing again from the already-finalized bytes must be idempotent.
        let pseudo = PseudoHeader::V4 {
            ip: Ipv4Frame::new(&ip_bytes[..]),
            udp_length: expected_len,
        };
        compute_fields(&mut segment, Some(pseudo));
        assert_eq!(UdpFrame::new(&segment[..]).checksum(), checksum_first);
    }

    #[test]
    fn zero_checksum_is_transmitted_as_all_ones() {
        assert_eq!(checksum_or_all_ones(0), 0xffff);
        assert_eq!(checksum_or_all_ones(0x1234), 0x1234);
    }
}
