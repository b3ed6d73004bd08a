//! The 802.1Q VLAN tag: 4 bytes, priority/CFI/VID packed into one 16-bit field plus an ethertype.

use byteorder::{BigEndian, ByteOrder};

use crate::no_std_prelude::Vec;
use crate::tag::ProtocolTag;
use crate::wire::{self, ParseOutcome};

/// Byte length of a VLAN tag.
pub const HEADER_LEN: usize = 4;

const TCI_RANGE: core::ops::Range<usize> = 0..2;
const ETHERTYPE_RANGE: core::ops::Range<usize> = 2..4;

/// A read/write view of an 802.1Q tag over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct VlanFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> VlanFrame<T> {
    /// Wrap `buffer`, which must be at least [`HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        VlanFrame { buffer }
    }

    fn tci(&self) -> u16 {
        BigEndian::read_u16(&self.buffer.as_ref()[TCI_RANGE])
    }

    /// 3-bit priority code point.
    pub fn priority(&self) -> u8 {
        (self.tci() >> 13) as u8
    }

    /// The drop-eligible / canonical-format indicator bit.
    pub fn cfi(&self) -> bool {
        (self.tci() >> 12) & 0x1 != 0
    }

    /// 12-bit VLAN identifier.
    pub fn vlan_id(&self) -> u16 {
        self.tci() & 0x0fff
    }

    /// The 16-bit ethertype field, host order.
    pub fn ethertype(&self) -> u16 {
        BigEndian::read_u16(&self.buffer.as_ref()[ETHERTYPE_RANGE])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> VlanFrame<T> {
    fn set_tci(&mut self, tci: u16) {
        BigEndian::write_u16(&mut self.buffer.as_mut()[TCI_RANGE], tci);
    }

    /// Set priority, CFI and VLAN ID together (they share one wire field).
    pub fn set_tag(&mut self, priority: u8, cfi: bool, vlan_id: u16) {
        let tci = ((priority as u16 & 0x7) << 13) | ((cfi as u16) << 12) | (vlan_id & 0x0fff);
        self.set_tci(tci);
    }

    /// Set the ethertype field.
    pub fn set_ethertype(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.buffer.as_mut()[ETHERTYPE_RANGE], value);
    }
}

/// Build a detached VLAN tag's bytes.
pub fn build(priority: u8, cfi: bool, vlan_id: u16, ethertype: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_LEN];
    let mut frame = VlanFrame::new(&mut bytes[..]);
    frame.set_tag(priority, cfi, vlan_id);
    frame.set_ethertype(ethertype);
    bytes
}

/// Inspect `remaining` and decide what follows; VLAN tags nest via ethertype `0x8100`.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    if remaining.len() < HEADER_LEN {
        return ParseOutcome::Truncated;
    }
    let frame = VlanFrame::new(remaining);
    match wire::tag_for_ethertype(frame.ethertype()) {
        Some(next) => ParseOutcome::Continue { local_len: HEADER_LEN, next },
        None => ParseOutcome::Continue { local_len: HEADER_LEN, next: ProtocolTag::Payload },
    }
}

/// Set the ethertype field to match the tag of whatever layer follows, when that tag maps to a
/// known ethertype; otherwise the explicitly built-in value is preserved (see
/// [`super::ethernet::compute_fields`]).
pub(crate) fn compute_fields(bytes: &mut [u8], next: Option<ProtocolTag>) {
    if let Some(ethertype) = next.and_then(wire::ethertype_for) {
        VlanFrame::new(bytes).set_ethertype(ethertype);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_packs_priority_cfi_vid() {
        let bytes = build(5, true, 100, 0x0800);
        let frame = VlanFrame::new(&bytes[..]);
        assert_eq!(frame.priority(), 5);
        assert!(frame.cfi());
        assert_eq!(frame.vlan_id(), 100);
        assert_eq!(frame.ethertype(), 0x0800);
    }

    #[test]
    fn nested_vlan_is_recognized() {
        let bytes = build(0, false, 10, 0x8100);
        assert_eq!(
            parse_step(&bytes),
            ParseOutcome::Continue { local_len: HEADER_LEN, next: ProtocolTag::Vlan }
        );
    }
}
