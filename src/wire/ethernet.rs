//! The Ethernet II header: 14 bytes, destination MAC, source MAC, ethertype.

use byteorder::{BigEndian, ByteOrder};

use crate::address::MacAddress;
use crate::no_std_prelude::Vec;
use crate::tag::ProtocolTag;
use crate::wire::{self, ParseOutcome};

/// Byte length of a bare Ethernet II header.
pub const HEADER_LEN: usize = 14;

const DST_RANGE: core::ops::Range<usize> = 0..6;
const SRC_RANGE: core::ops::Range<usize> = 6..12;
const ETHERTYPE_RANGE: core::ops::Range<usize> = 12..14;

/// A read/write view of an Ethernet II header over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct EthernetFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> EthernetFrame<T> {
    /// Wrap `buffer`, which must be at least [`HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        EthernetFrame { buffer }
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// The destination hardware address.
    pub fn dst_addr(&self) -> MacAddress {
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&self.bytes()[DST_RANGE]);
        MacAddress(bytes)
    }

    /// The source hardware address.
    pub fn src_addr(&self) -> MacAddress {
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&self.bytes()[SRC_RANGE]);
        MacAddress(bytes)
    }

    /// The 16-bit ethertype field, host order.
    pub fn ethertype(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[ETHERTYPE_RANGE])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> EthernetFrame<T> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    /// Set the destination hardware address.
    pub fn set_dst_addr(&mut self, addr: MacAddress) {
        self.bytes_mut()[DST_RANGE].copy_from_slice(&addr.0);
    }

    /// Set the source hardware address.
    pub fn set_src_addr(&mut self, addr: MacAddress) {
        self.bytes_mut()[SRC_RANGE].copy_from_slice(&addr.0);
    }

    /// Set the ethertype field.
    pub fn set_ethertype(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[ETHERTYPE_RANGE], value);
    }
}

/// Build a detached Ethernet header's bytes.
pub fn build(src: MacAddress, dst: MacAddress, ethertype: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_LEN];
    let mut frame = EthernetFrame::new(&mut bytes[..]);
    frame.set_dst_addr(dst);
    frame.set_src_addr(src);
    frame.set_ethertype(ethertype);
    bytes
}

/// Inspect `remaining` (the bytes from this layer's offset onward) and decide what follows.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    if remaining.len() < HEADER_LEN {
        return ParseOutcome::Truncated;
    }
    let frame = EthernetFrame::new(remaining);
    match wire::tag_for_ethertype(frame.ethertype()) {
        Some(next) => ParseOutcome::Continue { local_len: HEADER_LEN, next },
        None => ParseOutcome::Continue { local_len: HEADER_LEN, next: ProtocolTag::Payload },
    }
}

/// Set the ethertype field to match the tag of whatever layer follows, when that tag maps to a
/// known ethertype. Leaves the field as-is when there's no next layer, or the next layer is
/// opaque (`Payload`/`Unknown`) — the explicitly built-in value is preserved in that case.
pub(crate) fn compute_fields(bytes: &mut [u8], next: Option<ProtocolTag>) {
    if let Some(ethertype) = next.and_then(wire::ethertype_for) {
        EthernetFrame::new(bytes).set_ethertype(ethertype);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_matches_spec_s1_header() {
        let src = MacAddress([0xaa; 6]);
        let dst = MacAddress([0xbb; 6]);
        let bytes = build(src, dst, 0x0800);
        assert_eq!(
            bytes,
            vec![0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x08, 0x00]
        );
    }

    #[test]
    fn parse_step_recognizes_ipv4() {
        let bytes = build(MacAddress([1; 6]), MacAddress([2; 6]), 0x0800);
        match parse_step(&bytes) {
            ParseOutcome::Continue { local_len, next } => {
                assert_eq!(local_len, HEADER_LEN);
                assert_eq!(next, ProtocolTag::Ipv4);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn parse_step_truncated_header() {
        let short = [0u8; 10];
        assert_eq!(parse_step(&short), ParseOutcome::Truncated);
    }

    #[test]
    fn compute_fields_sets_ethertype_from_next_tag() {
        let mut bytes = build(MacAddress([1; 6]), MacAddress([2; 6]), 0);
        compute_fields(&mut bytes, Some(ProtocolTag::Ipv6));
        assert_eq!(EthernetFrame::new(&bytes[..]).ethertype(), 0x86dd);
    }
}
