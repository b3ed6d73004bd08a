//! IPv6: a fixed 40-byte header, no options, no header checksum.

use byteorder::{BigEndian, ByteOrder};

use crate::address::Ipv6Address;
use crate::no_std_prelude::Vec;
use crate::tag::ProtocolTag;
use crate::wire::{self, ParseOutcome};

/// Byte length of the fixed IPv6 header.
pub const HEADER_LEN: usize = 40;

const VERSION_TC_FLOW: core::ops::Range<usize> = 0..4;
const PAYLOAD_LEN: core::ops::Range<usize> = 4..6;
const NEXT_HEADER: usize = 6;
const HOP_LIMIT: usize = 7;
const SRC: core::ops::Range<usize> = 8..24;
const DST: core::ops::Range<usize> = 24..40;

/// A read/write view of an IPv6 header over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct Ipv6Frame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Ipv6Frame<T> {
    /// Wrap `buffer`, which must be at least [`HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        Ipv6Frame { buffer }
    }

    fn word(&self) -> u32 {
        BigEndian::read_u32(&self.buffer.as_ref()[VERSION_TC_FLOW])
    }

    /// The 4-bit version field (expected to read 6).
    pub fn version(&self) -> u8 {
        (self.word() >> 28) as u8
    }

    /// The 8-bit traffic class.
    pub fn traffic_class(&self) -> u8 {
        (self.word() >> 20) as u8
    }

    /// The 20-bit flow label.
    pub fn flow_label(&self) -> u32 {
        self.word() & 0x000f_ffff
    }

    /// The payload length (everything after this 40-byte header), host order.
    pub fn payload_length(&self) -> u16 {
        BigEndian::read_u16(&self.buffer.as_ref()[PAYLOAD_LEN])
    }

    /// The next-header protocol number.
    pub fn next_header(&self) -> u8 {
        self.buffer.as_ref()[NEXT_HEADER]
    }

    /// The hop limit (IPv6's analogue of IPv4's TTL).
    pub fn hop_limit(&self) -> u8 {
        self.buffer.as_ref()[HOP_LIMIT]
    }

    /// Source address.
    pub fn src_addr(&self) -> Ipv6Address {
        let mut out = [0u8; 16];
        out.copy_from_slice(&self.buffer.as_ref()[SRC]);
        Ipv6Address(out)
    }

    /// Destination address.
    pub fn dst_addr(&self) -> Ipv6Address {
        let mut out = [0u8; 16];
        out.copy_from_slice(&self.buffer.as_ref()[DST]);
        Ipv6Address(out)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Ipv6Frame<T> {
    fn set_word(&mut self, value: u32) {
        BigEndian::write_u32(&mut self.buffer.as_mut()[VERSION_TC_FLOW], value);
    }

    /// Set version, traffic class and flow label together (they share one wire word).
    pub fn set_version_tc_flow(&mut self, version: u8, traffic_class: u8, flow_label: u32) {
        let word = ((version as u32 & 0xf) << 28)
            | ((traffic_class as u32) << 20)
            | (flow_label & 0x000f_ffff);
        self.set_word(word);
    }

    /// Set the payload length field.
    pub fn set_payload_length(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.buffer.as_mut()[PAYLOAD_LEN], value);
    }

    /// Set the next-header protocol number.
    pub fn set_next_header(&mut self, value: u8) {
        self.buffer.as_mut()[NEXT_HEADER] = value;
    }

    /// Set the hop limit.
    pub fn set_hop_limit(&mut self, value: u8) {
        self.buffer.as_mut()[HOP_LIMIT] = value;
    }

    /// Set the source address.
    pub fn set_src_addr(&mut self, addr: Ipv6Address) {
        addr.copy_to(&mut self.buffer.as_mut()[SRC]);
    }

    /// Set the destination address.
    pub fn set_dst_addr(&mut self, addr: Ipv6Address) {
        addr.copy_to(&mut self.buffer.as_mut()[DST]);
    }
}

/// Build a detached IPv6 header's bytes.
pub fn build(
    src: Ipv6Address,
    dst: Ipv6Address,
    traffic_class: u8,
    flow_label: u32,
    hop_limit: u8,
    next_header: u8,
) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_LEN];
    let mut frame = Ipv6Frame::new(&mut bytes[..]);
    frame.set_version_tc_flow(6, traffic_class, flow_label);
    frame.set_hop_limit(hop_limit);
    frame.set_next_header(next_header);
    frame.set_src_addr(src);
    frame.set_dst_addr(dst);
    bytes
}

/// Inspect `remaining` and decide what follows, based on the `next_header` field.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    if remaining.len() < HEADER_LEN {
        return ParseOutcome::Truncated;
    }
    let frame = Ipv6Frame::new(remaining);
    match wire::tag_for_protocol_number(frame.next_header()) {
        Some(next) => ParseOutcome::Continue { local_len: HEADER_LEN, next },
        None => ParseOutcome::Continue { local_len: HEADER_LEN, next: ProtocolTag::Payload },
    }
}

/// Set version, payload length (everything after this header) and next-header from the next
/// layer's tag, when that tag maps to a known protocol number — otherwise the explicitly
/// built-in value is preserved.
pub(crate) fn compute_fields(bytes: &mut [u8], chain_after_here: usize, next: Option<ProtocolTag>) {
    let mut frame = Ipv6Frame::new(bytes);
    let tc = frame.traffic_class();
    let flow = frame.flow_label();
    frame.set_version_tc_flow(6, tc, flow);
    frame.set_payload_length(chain_after_here as u16);
    if let Some(next_header) = next.and_then(wire::protocol_number_for) {
        frame.set_next_header(next_header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_read_back_s4_addresses() {
        let src: Ipv6Address = "fe80::4dc7:f593:1f7b:dc11".parse().unwrap();
        let dst: Ipv6Address = "ff02::c".parse().unwrap();
        let bytes = build(src, dst, 0, 0, 255, 17);
        let frame = Ipv6Frame::new(&bytes[..]);
        assert_eq!(frame.version(), 6);
        assert_eq!(frame.src_addr(), src);
        assert_eq!(frame.dst_addr(), dst);
        assert_eq!(frame.next_header(), 17);
    }

    #[test]
    fn compute_fields_sets_payload_length() {
        let mut bytes = build(Ipv6Address::UNSPECIFIED, Ipv6Address::UNSPECIFIED, 0, 0, 64, 0);
        compute_fields(&mut bytes, 154, Some(ProtocolTag::Udp));
        let frame = Ipv6Frame::new(&bytes[..]);
        assert_eq!(frame.payload_length(), 154);
        assert_eq!(frame.next_header(), 17);
    }
}
