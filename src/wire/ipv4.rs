//! IPv4: a minimum-20-byte header with optional words padding it out to `ihl * 4`.

use byteorder::{BigEndian, ByteOrder};

use crate::address::Ipv4Address;
use crate::checksum::internet_checksum;
use crate::no_std_prelude::Vec;
use crate::tag::ProtocolTag;
use crate::wire::{self, ParseOutcome};

/// Byte length of an IPv4 header carrying no options.
pub const MIN_HEADER_LEN: usize = 20;

const VERSION_IHL: usize = 0;
const TOS: usize = 1;
const TOTAL_LEN: core::ops::Range<usize> = 2..4;
const IDENT: core::ops::Range<usize> = 4..6;
const FLAGS_FRAG: core::ops::Range<usize> = 6..8;
const TTL: usize = 8;
const PROTOCOL: usize = 9;
const CHECKSUM: core::ops::Range<usize> = 10..12;
const SRC: core::ops::Range<usize> = 12..16;
const DST: core::ops::Range<usize> = 16..20;

/// A read/write view of an IPv4 header (plus any options) over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct Ipv4Frame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Ipv4Frame<T> {
    /// Wrap `buffer`, which must be at least [`MIN_HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        Ipv4Frame { buffer }
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// The 4-bit version field (expected to read 4).
    pub fn version(&self) -> u8 {
        self.bytes()[VERSION_IHL] >> 4
    }

    /// The header length in 32-bit words.
    pub fn ihl(&self) -> u8 {
        self.bytes()[VERSION_IHL] & 0x0f
    }

    /// The header length in bytes (`ihl * 4`).
    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    /// Type of service / DSCP+ECN byte.
    pub fn tos(&self) -> u8 {
        self.bytes()[TOS]
    }

    /// Total length (header + data), host order.
    pub fn total_length(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[TOTAL_LEN])
    }

    /// Identification field.
    pub fn identification(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[IDENT])
    }

    /// Combined flags (3 bits) and fragment offset (13 bits), host order.
    pub fn flags_and_fragment_offset(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[FLAGS_FRAG])
    }

    /// Time to live.
    pub fn ttl(&self) -> u8 {
        self.bytes()[TTL]
    }

    /// The upper-layer protocol number.
    pub fn protocol(&self) -> u8 {
        self.bytes()[PROTOCOL]
    }

    /// The header checksum field as stored (not recomputed).
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[CHECKSUM])
    }

    /// Source address.
    pub fn src_addr(&self) -> Ipv4Address {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes()[SRC]);
        Ipv4Address(out)
    }

    /// Destination address.
    pub fn dst_addr(&self) -> Ipv4Address {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes()[DST]);
        Ipv4Address(out)
    }

    /// The option bytes beyond the fixed 20-byte header, if any.
    pub fn options(&self) -> &[u8] {
        &self.bytes()[MIN_HEADER_LEN..self.header_len()]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Ipv4Frame<T> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    /// Set version and IHL together (they share one wire byte).
    pub fn set_version_ihl(&mut self, version: u8, ihl: u8) {
        self.bytes_mut()[VERSION_IHL] = (version << 4) | (ihl & 0x0f);
    }

    /// Set the type of service byte.
    pub fn set_tos(&mut self, value: u8) {
        self.bytes_mut()[TOS] = value;
    }

    /// Set the total length field.
    pub fn set_total_length(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[TOTAL_LEN], value);
    }

    /// Set the identification field.
    pub fn set_identification(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[IDENT], value);
    }

    /// Set the combined flags/fragment-offset field.
    pub fn set_flags_and_fragment_offset(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[FLAGS_FRAG], value);
    }

    /// Set the time to live.
    pub fn set_ttl(&mut self, value: u8) {
        self.bytes_mut()[TTL] = value;
    }

    /// Set the upper-layer protocol number.
    pub fn set_protocol(&mut self, value: u8) {
        self.bytes_mut()[PROTOCOL] = value;
    }

    /// Set the header checksum field.
    pub fn set_checksum(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[CHECKSUM], value);
    }

    /// Set the source address.
    pub fn set_src_addr(&mut self, addr: Ipv4Address) {
        self.bytes_mut()[SRC].copy_from_slice(&addr.0);
    }

    /// Set the destination address.
    pub fn set_dst_addr(&mut self, addr: Ipv4Address) {
        self.bytes_mut()[DST].copy_from_slice(&addr.0);
    }
}

/// Build a detached IPv4 header's bytes. `options` must already be padded to a multiple of 4
/// bytes by the caller; an unpadded options slice is a programmer error, not a recoverable one.
pub fn build(
    src: Ipv4Address,
    dst: Ipv4Address,
    identification: u16,
    flags_and_fragment_offset: u16,
    ttl: u8,
    protocol: u8,
    options: &[u8],
) -> Vec<u8> {
    assert_eq!(options.len() % 4, 0, "IPv4 options must be padded to a 4-byte boundary");
    let ihl = (MIN_HEADER_LEN + options.len()) / 4;
    assert!(ihl <= 0x0f, "IPv4 options too long to express in a 4-bit IHL");

    let mut bytes = vec![0u8; MIN_HEADER_LEN + options.len()];
    bytes[MIN_HEADER_LEN..].copy_from_slice(options);

    let mut frame = Ipv4Frame::new(&mut bytes[..]);
    frame.set_version_ihl(4, ihl as u8);
    frame.set_identification(identification);
    frame.set_flags_and_fragment_offset(flags_and_fragment_offset);
    frame.set_ttl(ttl);
    frame.set_protocol(protocol);
    frame.set_src_addr(src);
    frame.set_dst_addr(dst);
    bytes
}

/// Inspect `remaining` and decide what follows, based on the `protocol` field.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    if remaining.len() < MIN_HEADER_LEN {
        return ParseOutcome::Truncated;
    }
    let frame = Ipv4Frame::new(remaining);
    let header_len = frame.header_len();
    if header_len < MIN_HEADER_LEN || remaining.len() < header_len {
        return ParseOutcome::Truncated;
    }
    match wire::tag_for_protocol_number(frame.protocol()) {
        Some(next) => ParseOutcome::Continue { local_len: header_len, next },
        None => ParseOutcome::Continue { local_len: header_len, next: ProtocolTag::Payload },
    }
}

/// Set version/IHL, total length (this layer plus everything after it), the protocol number from
/// the next layer's tag (when it maps to a known number — otherwise the explicitly built-in value
/// is preserved), then zero and recompute the header checksum.
pub(crate) fn compute_fields(bytes: &mut [u8], header_len: usize, chain_from_here: usize, next: Option<ProtocolTag>) {
    let ihl = (header_len / 4) as u8;

    let mut frame = Ipv4Frame::new(&mut *bytes);
    frame.set_version_ihl(4, ihl);
    frame.set_total_length(chain_from_here as u16);
    if let Some(protocol) = next.and_then(wire::protocol_number_for) {
        frame.set_protocol(protocol);
    }
    frame.set_checksum(0);

    let checksum = internet_checksum(&[&bytes[..header_len]]);
    Ipv4Frame::new(bytes).set_checksum(checksum);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_read_back() {
        let src: Ipv4Address = "212.199.202.9".parse().unwrap();
        let dst: Ipv4Address = "10.0.0.6".parse().unwrap();
        let bytes = build(src, dst, 0x4F4C, 0x4000, 59, 6, &[]);
        let frame = Ipv4Frame::new(&bytes[..]);
        assert_eq!(frame.version(), 4);
        assert_eq!(frame.ihl(), 5);
        assert_eq!(frame.identification(), 0x4F4C);
        assert_eq!(frame.ttl(), 59);
        assert_eq!(frame.protocol(), 6);
        assert_eq!(frame.src_addr(), src);
        assert_eq!(frame.dst_addr(), dst);
    }

    #[test]
    fn compute_fields_sets_total_length_and_checksum() {
        let mut bytes = build(
            "212.199.202.9".parse().unwrap(),
            "10.0.0.6".parse().unwrap(),
            0x4F4C,
            0x4000,
            59,
            6,
            &[],
        );
        compute_fields(&mut bytes, MIN_HEADER_LEN, MIN_HEADER_LEN + 9, Some(ProtocolTag::Tcp));
        let frame = Ipv4Frame::new(&bytes[..]);
        assert_eq!(frame.total_length() as usize, MIN_HEADER_LEN + 9);
        assert_eq!(frame.protocol(), 6);
        assert_eq!(internet_checksum(&[&bytes[..MIN_HEADER_LEN]]), 0);
    }

    #[test]
    fn truncated_header_is_reported() {
        assert_eq!(parse_step(&[0u8; 10]), ParseOutcome::Truncated);
    }
}
