//! ARP: a 28-byte fixed header for Ethernet/IPv4 address resolution.

use byteorder::{BigEndian, ByteOrder};

use crate::address::{Ipv4Address, MacAddress};
use crate::no_std_prelude::Vec;
use crate::wire::ParseOutcome;

/// Byte length of the (Ethernet/IPv4-shaped) ARP header.
pub const HEADER_LEN: usize = 28;

/// `opcode` value for a request.
pub const OP_REQUEST: u16 = 1;
/// `opcode` value for a reply.
pub const OP_REPLY: u16 = 2;

const HTYPE: core::ops::Range<usize> = 0..2;
const PTYPE: core::ops::Range<usize> = 2..4;
const HLEN: usize = 4;
const PLEN: usize = 5;
const OPER: core::ops::Range<usize> = 6..8;
const SHA: core::ops::Range<usize> = 8..14;
const SPA: core::ops::Range<usize> = 14..18;
const THA: core::ops::Range<usize> = 18..24;
const TPA: core::ops::Range<usize> = 24..28;

/// A read/write view of an ARP header over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct ArpFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> ArpFrame<T> {
    /// Wrap `buffer`, which must be at least [`HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        ArpFrame { buffer }
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Hardware type (1 for Ethernet).
    pub fn hardware_type(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[HTYPE])
    }

    /// Protocol type (the ethertype of the resolved protocol, 0x0800 for IPv4).
    pub fn protocol_type(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[PTYPE])
    }

    /// Hardware address length (6 for Ethernet).
    pub fn hardware_len(&self) -> u8 {
        self.bytes()[HLEN]
    }

    /// Protocol address length (4 for IPv4).
    pub fn protocol_len(&self) -> u8 {
        self.bytes()[PLEN]
    }

    /// The operation code ([`OP_REQUEST`] or [`OP_REPLY`]).
    pub fn opcode(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[OPER])
    }

    /// Sender hardware address.
    pub fn sender_mac(&self) -> MacAddress {
        let mut out = [0u8; 6];
        out.copy_from_slice(&self.bytes()[SHA]);
        MacAddress(out)
    }

    /// Sender protocol address.
    pub fn sender_ip(&self) -> Ipv4Address {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes()[SPA]);
        Ipv4Address(out)
    }

    /// Target hardware address.
    pub fn target_mac(&self) -> MacAddress {
        let mut out = [0u8; 6];
        out.copy_from_slice(&self.bytes()[THA]);
        MacAddress(out)
    }

    /// Target protocol address.
    pub fn target_ip(&self) -> Ipv4Address {
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.bytes()[TPA]);
        Ipv4Address(out)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> ArpFrame<T> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    /// Set the hardware type.
    pub fn set_hardware_type(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[HTYPE], value);
    }

    /// Set the protocol type.
    pub fn set_protocol_type(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[PTYPE], value);
    }

    /// Set the hardware address length.
    pub fn set_hardware_len(&mut self, value: u8) {
        self.bytes_mut()[HLEN] = value;
    }

    /// Set the protocol address length.
    pub fn set_protocol_len(&mut self, value: u8) {
        self.bytes_mut()[PLEN] = value;
    }

    /// Set the operation code.
    pub fn set_opcode(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[OPER], value);
    }

    /// Set the sender hardware address.
    pub fn set_sender_mac(&mut self, addr: MacAddress) {
        self.bytes_mut()[SHA].copy_from_slice(&addr.0);
    }

    /// Set the sender protocol address.
    pub fn set_sender_ip(&mut self, addr: Ipv4Address) {
        self.bytes_mut()[SPA].copy_from_slice(&addr.0);
    }

    /// Set the target hardware address.
    pub fn set_target_mac(&mut self, addr: MacAddress) {
        self.bytes_mut()[THA].copy_from_slice(&addr.0);
    }

    /// Set the target protocol address.
    pub fn set_target_ip(&mut self, addr: Ipv4Address) {
        self.bytes_mut()[TPA].copy_from_slice(&addr.0);
    }
}

/// Build a detached ARP header's bytes (Ethernet/IPv4 only — the shape this crate supports).
pub fn build(
    opcode: u16,
    sender_mac: MacAddress,
    sender_ip: Ipv4Address,
    target_mac: MacAddress,
    target_ip: Ipv4Address,
) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_LEN];
    let mut frame = ArpFrame::new(&mut bytes[..]);
    frame.set_hardware_type(1);
    frame.set_protocol_type(0x0800);
    frame.set_hardware_len(6);
    frame.set_protocol_len(4);
    frame.set_opcode(opcode);
    frame.set_sender_mac(sender_mac);
    frame.set_sender_ip(sender_ip);
    frame.set_target_mac(target_mac);
    frame.set_target_ip(target_ip);
    bytes
}

/// ARP has no next layer.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    if remaining.len() < HEADER_LEN {
        return ParseOutcome::Truncated;
    }
    ParseOutcome::Terminal { local_len: HEADER_LEN }
}

/// Normalize the hardware/protocol type and length fields; zero the target MAC on a request
/// (the target hardware address is not yet known when asking for it).
pub(crate) fn compute_fields(bytes: &mut [u8]) {
    let mut frame = ArpFrame::new(bytes);
    frame.set_hardware_type(1);
    frame.set_protocol_type(0x0800);
    frame.set_hardware_len(6);
    frame.set_protocol_len(4);
    if frame.opcode() == OP_REQUEST {
        frame.set_target_mac(MacAddress::UNSPECIFIED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_read_back() {
        let sender_mac = MacAddress([1; 6]);
        let sender_ip: Ipv4Address = "10.0.0.1".parse().unwrap();
        let target_mac = MacAddress([2; 6]);
        let target_ip: Ipv4Address = "10.0.0.2".parse().unwrap();
        let bytes = build(OP_REQUEST, sender_mac, sender_ip, target_mac, target_ip);
        let frame = ArpFrame::new(&bytes[..]);
        assert_eq!(frame.hardware_type(), 1);
        assert_eq!(frame.protocol_type(), 0x0800);
        assert_eq!(frame.opcode(), OP_REQUEST);
        assert_eq!(frame.sender_mac(), sender_mac);
        assert_eq!(frame.target_ip(), target_ip);
    }

    #[test]
    fn compute_fields_zeroes_target_mac_on_request() {
        let mut bytes = build(
            OP_REQUEST,
            MacAddress([1; 6]),
            Ipv4Address::UNSPECIFIED,
            MacAddress([0xff; 6]),
            Ipv4Address::UNSPECIFIED,
        );
        compute_fields(&mut bytes);
        assert_eq!(ArpFrame::new(&bytes[..]).target_mac(), MacAddress::UNSPECIFIED);
    }

    #[test]
    fn compute_fields_preserves_target_mac_on_reply() {
        let mut bytes = build(
            OP_REPLY,
            MacAddress([1; 6]),
            Ipv4Address::UNSPECIFIED,
            MacAddress([0xff; 6]),
            Ipv4Address::UNSPECIFIED,
        );
        compute_fields(&mut bytes);
        assert_eq!(ArpFrame::new(&bytes[..]).target_mac(), MacAddress([0xff; 6]));
    }
}
