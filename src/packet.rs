//! The layer chain atop a shared raw buffer: parsing, construction, and finalization.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::address::{Ipv4Address, Ipv6Address, MacAddress};
use crate::buffer::{RawBuffer, Timestamp};
use crate::error::{Error, Result};
use crate::no_std_prelude::Vec;
use crate::tag::{ProtocolTag, TagSet};
use crate::wire::{arp, ethernet, ipv4, ipv6, payload, tcp, udp, vlan, ParseOutcome};

static NEXT_PACKET_ID: AtomicU64 = AtomicU64::new(0);

fn next_packet_id() -> u64 {
    NEXT_PACKET_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug)]
struct LayerEntry {
    tag: ProtocolTag,
    offset: usize,
    len: usize,
}

/// Names a layer's position within a specific [`Packet`]'s chain.
///
/// A handle is only meaningful against the packet it was produced from (checked at runtime via
/// packet identity; presenting one to the wrong packet is an [`Error::OwnershipConflict`]) and
/// only until the next structural mutation of that packet — `insert_layer`/`remove_layer` shift
/// the indices of layers after the mutation point. Re-fetch handles via the lookup methods after
/// mutating rather than holding them across a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerHandle {
    packet_id: u64,
    index: usize,
}

/// A layer that has been built but not yet attached to any packet.
///
/// Attaching one (via [`Packet::add_layer`] or [`Packet::insert_layer`]) consumes it by value, so
/// reusing it for a second attachment is a compile error rather than a runtime one.
pub struct DetachedLayer {
    tag: ProtocolTag,
    bytes: Vec<u8>,
}

impl DetachedLayer {
    /// Wrap already-encoded header bytes under the given protocol tag.
    pub fn new(tag: ProtocolTag, bytes: Vec<u8>) -> Self {
        DetachedLayer { tag, bytes }
    }

    /// A detached Ethernet II header.
    pub fn ethernet(src: MacAddress, dst: MacAddress, ethertype: u16) -> Self {
        DetachedLayer::new(ProtocolTag::Ethernet, ethernet::build(src, dst, ethertype))
    }

    /// A detached 802.1Q VLAN tag.
    pub fn vlan(priority: u8, cfi: bool, vlan_id: u16, ethertype: u16) -> Self {
        DetachedLayer::new(ProtocolTag::Vlan, vlan::build(priority, cfi, vlan_id, ethertype))
    }

    /// A detached ARP header (Ethernet/IPv4 shape).
    pub fn arp(
        opcode: u16,
        sender_mac: MacAddress,
        sender_ip: Ipv4Address,
        target_mac: MacAddress,
        target_ip: Ipv4Address,
    ) -> Self {
        DetachedLayer::new(
            ProtocolTag::Arp,
            arp::build(opcode, sender_mac, sender_ip, target_mac, target_ip),
        )
    }

    /// A detached IPv4 header. `options` must already be padded to a 4-byte boundary.
    #[allow(clippy::too_many_arguments)]
    pub fn ipv4(
        src: Ipv4Address,
        dst: Ipv4Address,
        identification: u16,
        flags_and_fragment_offset: u16,
        ttl: u8,
        protocol: u8,
        options: &[u8],
    ) -> Self {
        DetachedLayer::new(
            ProtocolTag::Ipv4,
            ipv4::build(src, dst, identification, flags_and_fragment_offset, ttl, protocol, options),
        )
    }

    /// A detached IPv6 header.
    pub fn ipv6(
        src: Ipv6Address,
        dst: Ipv6Address,
        traffic_class: u8,
        flow_label: u32,
        hop_limit: u8,
        next_header: u8,
    ) -> Self {
        DetachedLayer::new(
            ProtocolTag::Ipv6,
            ipv6::build(src, dst, traffic_class, flow_label, hop_limit, next_header),
        )
    }

    /// A detached UDP header.
    pub fn udp(src_port: u16, dst_port: u16) -> Self {
        DetachedLayer::new(ProtocolTag::Udp, udp::build(src_port, dst_port))
    }

    /// A detached TCP header, with typed options.
    #[allow(clippy::too_many_arguments)]
    pub fn tcp(
        src_port: u16,
        dst_port: u16,
        sequence: u32,
        ack: u32,
        flags: tcp::Flags,
        window: u16,
        urgent_ptr: u16,
        options: &[tcp::TcpOption],
    ) -> Self {
        DetachedLayer::new(
            ProtocolTag::Tcp,
            tcp::build(src_port, dst_port, sequence, ack, flags, window, urgent_ptr, options),
        )
    }

    /// A detached opaque payload.
    pub fn payload(bytes: Vec<u8>) -> Self {
        DetachedLayer::new(ProtocolTag::Payload, bytes)
    }
}

/// An owned raw buffer plus the ordered chain of typed protocol layers over it.
///
/// See the crate-level docs for the three workflows this type supports: parsing
/// ([`Packet::from_raw`]), construction ([`Packet::add_layer`], [`Packet::insert_layer`]), and
/// finalization ([`Packet::compute_calculate_fields`]).
pub struct Packet {
    id: u64,
    buffer: RawBuffer,
    layers: Vec<LayerEntry>,
    tags: TagSet,
}

enum PrevIpHeader {
    V4(Vec<u8>),
    V6(Vec<u8>),
}

impl Packet {
    /// An empty packet with at least `initial_capacity` bytes of backing storage reserved.
    pub fn new(initial_capacity: usize) -> Self {
        Packet {
            id: next_packet_id(),
            buffer: RawBuffer::with_capacity(initial_capacity),
            layers: Vec::new(),
            tags: TagSet::new(),
        }
    }

    /// Take ownership of a captured frame and parse it into a chain of typed layers, starting
    /// from Ethernet. A header that claims more bytes than remain ends the chain early with a
    /// single `Payload` layer over whatever residual bytes are left; this never fails the call.
    pub fn from_raw(bytes: Vec<u8>, timestamp: Timestamp) -> Self {
        let mut packet = Packet {
            id: next_packet_id(),
            buffer: RawBuffer::from_vec(bytes, timestamp),
            layers: Vec::new(),
            tags: TagSet::new(),
        };

        let mut offset = 0;
        let mut tag = ProtocolTag::Ethernet;
        loop {
            let remaining = &packet.buffer.data()[offset..];
            if remaining.is_empty() {
                break;
            }
            let outcome = match tag {
                ProtocolTag::Ethernet => ethernet::parse_step(remaining),
                ProtocolTag::Vlan => vlan::parse_step(remaining),
                ProtocolTag::Arp => arp::parse_step(remaining),
                ProtocolTag::Ipv4 => ipv4::parse_step(remaining),
                ProtocolTag::Ipv6 => ipv6::parse_step(remaining),
                ProtocolTag::Udp => udp::parse_step(remaining),
                ProtocolTag::Tcp => tcp::parse_step(remaining),
                ProtocolTag::Payload | ProtocolTag::Unknown => payload::parse_step(remaining),
            };
            match outcome {
                ParseOutcome::Continue { local_len, next } => {
                    packet.push_layer_entry(tag, offset, local_len);
                    offset += local_len;
                    tag = next;
                }
                ParseOutcome::Terminal { local_len } => {
                    packet.push_layer_entry(tag, offset, local_len);
                    break;
                }
                ParseOutcome::Truncated => {
                    let local_len = remaining.len();
                    packet.push_layer_entry(ProtocolTag::Payload, offset, local_len);
                    break;
                }
            }
        }
        packet
    }

    fn push_layer_entry(&mut self, tag: ProtocolTag, offset: usize, len: usize) {
        self.layers.push(LayerEntry { tag, offset, len });
        self.tags.insert(tag);
    }

    /// Append `layer` at the tail of the chain.
    pub fn add_layer(&mut self, layer: DetachedLayer) -> LayerHandle {
        let offset = self.buffer.len();
        let len = layer.bytes.len();
        self.buffer.append(&layer.bytes);
        self.push_layer_entry(layer.tag, offset, len);
        LayerHandle { packet_id: self.id, index: self.layers.len() - 1 }
    }

    /// Insert `layer` directly after `after` (or at the head, if `after` is `None`).
    ///
    /// Fails with [`Error::OwnershipConflict`] if `after` names a layer in a different packet.
    pub fn insert_layer(&mut self, after: Option<LayerHandle>, layer: DetachedLayer) -> Result<LayerHandle> {
        let insert_at = match after {
            Some(handle) => {
                if handle.packet_id != self.id {
                    return Err(Error::OwnershipConflict);
                }
                handle.index + 1
            }
            None => 0,
        };

        let offset = self.layer_offset_at(insert_at);
        let len = layer.bytes.len();
        self.buffer.insert(offset, &layer.bytes);
        for entry in self.layers.iter_mut().skip(insert_at) {
            entry.offset += len;
        }
        self.layers.insert(insert_at, LayerEntry { tag: layer.tag, offset, len });
        self.tags.insert(layer.tag);
        Ok(LayerHandle { packet_id: self.id, index: insert_at })
    }

    /// The offset at which a not-yet-inserted layer at chain position `index` would begin: the
    /// end of the buffer if `index` is past the last layer, or that layer's current offset.
    fn layer_offset_at(&self, index: usize) -> usize {
        match self.layers.get(index) {
            Some(entry) => entry.offset,
            None => self.buffer.len(),
        }
    }

    /// Remove `target` from the chain, shrinking the raw buffer and rebinding every following
    /// layer's offset. Fails with [`Error::NotFound`] if `target` is not in this packet.
    pub fn remove_layer(&mut self, target: LayerHandle) -> Result<()> {
        if target.packet_id != self.id || target.index >= self.layers.len() {
            return Err(Error::NotFound);
        }
        let removed = self.layers.remove(target.index);
        self.buffer.remove(removed.offset, removed.len);
        for entry in self.layers.iter_mut().skip(target.index) {
            entry.offset -= removed.len;
        }
        self.recompute_tags();
        Ok(())
    }

    fn recompute_tags(&mut self) {
        self.tags.clear();
        for entry in &self.layers {
            self.tags.insert(entry.tag);
        }
    }

    /// The first layer in the chain, if any.
    pub fn get_first_layer(&self) -> Option<LayerHandle> {
        if self.layers.is_empty() {
            None
        } else {
            Some(LayerHandle { packet_id: self.id, index: 0 })
        }
    }

    /// The last layer in the chain, if any.
    pub fn get_last_layer(&self) -> Option<LayerHandle> {
        if self.layers.is_empty() {
            None
        } else {
            Some(LayerHandle { packet_id: self.id, index: self.layers.len() - 1 })
        }
    }

    /// The first layer in the chain whose tag matches `tag`.
    pub fn get_layer_of_type(&self, tag: ProtocolTag) -> Option<LayerHandle> {
        self.layers
            .iter()
            .position(|entry| entry.tag == tag)
            .map(|index| LayerHandle { packet_id: self.id, index })
    }

    /// The first layer after `from` (exclusive) whose tag matches `tag`.
    pub fn get_next_layer_of_type(&self, from: LayerHandle, tag: ProtocolTag) -> Option<LayerHandle> {
        if from.packet_id != self.id {
            return None;
        }
        self.layers
            .iter()
            .enumerate()
            .skip(from.index + 1)
            .find(|(_, entry)| entry.tag == tag)
            .map(|(index, _)| LayerHandle { packet_id: self.id, index })
    }

    /// The protocol tag of `handle`, or `None` if it does not name a layer in this packet.
    pub fn layer_tag(&self, handle: LayerHandle) -> Option<ProtocolTag> {
        if handle.packet_id != self.id {
            return None;
        }
        self.layers.get(handle.index).map(|entry| entry.tag)
    }

    /// This layer's bytes, `[offset, offset + local_len)` into the raw buffer.
    pub fn layer_bytes(&self, handle: LayerHandle) -> Option<&[u8]> {
        if handle.packet_id != self.id {
            return None;
        }
        self.layers
            .get(handle.index)
            .map(|entry| &self.buffer.data()[entry.offset..entry.offset + entry.len])
    }

    /// Whether any layer in the chain carries `tag`; an O(1) bitset lookup.
    pub fn is_packet_of_type(&self, tag: ProtocolTag) -> bool {
        self.tags.contains(tag)
    }

    /// The capture timestamp carried by the raw buffer.
    pub fn timestamp(&self) -> Timestamp {
        self.buffer.timestamp()
    }

    /// The buffer contents, for transmission or byte-exact comparison.
    pub fn get_raw_packet(&self) -> &[u8] {
        self.buffer.data()
    }

    fn prev_ip_header(&self, index: usize) -> Option<PrevIpHeader> {
        if index == 0 {
            return None;
        }
        let prev = self.layers[index - 1];
        let bytes = self.buffer.data()[prev.offset..prev.offset + prev.len].to_vec();
        match prev.tag {
            ProtocolTag::Ipv4 => Some(PrevIpHeader::V4(bytes)),
            ProtocolTag::Ipv6 => Some(PrevIpHeader::V6(bytes)),
            _ => None,
        }
    }

    /// Walk the chain tail-to-head, recomputing every layer's length/checksum/next-protocol
    /// fields. Tail-to-head is required: a layer's computed fields may depend on the
    /// already-finalized bytes of everything after it (§9: UDP length depends on payload length,
    /// IPv4 total length depends on UDP, ethertype depends on IPv4's presence).
    pub fn compute_calculate_fields(&mut self) {
        let buffer_len = self.buffer.len();
        for index in (0..self.layers.len()).rev() {
            let entry = self.layers[index];
            let next_tag = self.layers.get(index + 1).map(|e| e.tag);
            match entry.tag {
                ProtocolTag::Ethernet => {
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    ethernet::compute_fields(bytes, next_tag);
                }
                ProtocolTag::Vlan => {
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    vlan::compute_fields(bytes, next_tag);
                }
                ProtocolTag::Arp => {
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    arp::compute_fields(bytes);
                }
                ProtocolTag::Ipv4 => {
                    let chain_from_here = buffer_len - entry.offset;
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    ipv4::compute_fields(bytes, entry.len, chain_from_here, next_tag);
                }
                ProtocolTag::Ipv6 => {
                    let chain_after_here = buffer_len - entry.offset - entry.len;
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    ipv6::compute_fields(bytes, chain_after_here, next_tag);
                }
                ProtocolTag::Udp => {
                    let segment_len = (buffer_len - entry.offset) as u16;
                    let prev = self.prev_ip_header(index);
                    let pseudo = prev.as_ref().map(|p| match p {
                        PrevIpHeader::V4(bytes) => udp::PseudoHeader::V4 {
                            ip: ipv4::Ipv4Frame::new(bytes.as_slice()),
                            udp_length: segment_len,
                        },
                        PrevIpHeader::V6(bytes) => udp::PseudoHeader::V6 {
                            ip: ipv6::Ipv6Frame::new(bytes.as_slice()),
                            udp_length: segment_len,
                        },
                    });
                    let segment = &mut self.buffer.data_mut()[entry.offset..];
                    udp::compute_fields(segment, pseudo);
                }
                ProtocolTag::Tcp => {
                    let prev = self.prev_ip_header(index);
                    let pseudo = prev.as_ref().map(|p| match p {
                        PrevIpHeader::V4(bytes) => tcp::PseudoHeader::V4 { ip: ipv4::Ipv4Frame::new(bytes.as_slice()) },
                        PrevIpHeader::V6(bytes) => tcp::PseudoHeader::V6 { ip: ipv6::Ipv6Frame::new(bytes.as_slice()) },
                    });
                    let segment = &mut self.buffer.data_mut()[entry.offset..];
                    tcp::compute_fields(segment, pseudo);
                }
                ProtocolTag::Payload | ProtocolTag::Unknown => {
                    let bytes = &mut self.buffer.data_mut()[entry.offset..entry.offset + entry.len];
                    payload::compute_fields(bytes);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Ipv6Address;

    fn mac(byte: u8) -> MacAddress {
        MacAddress([byte; 6])
    }

    #[test]
    fn s1_ethernet_and_payload_construction() {
        let mut packet = Packet::new(18);
        packet.add_layer(DetachedLayer::ethernet(mac(0xaa), mac(0xbb), 0x0800));
        packet.add_layer(DetachedLayer::payload(vec![1, 2, 3, 4]));
        packet.compute_calculate_fields();

        assert_eq!(
            packet.get_raw_packet(),
            &[0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x08, 0x00, 1, 2, 3, 4][..]
        );
    }

    #[test]
    fn s2_ipv4_tcp_checksum_matches_reference_frame() {
        let mut packet = Packet::new(0);
        packet.add_layer(DetachedLayer::ethernet(
            "30:46:9a:23:fb:fa".parse().unwrap(),
            "08:00:27:19:1c:78".parse().unwrap(),
            0x0800,
        ));
        packet.add_layer(DetachedLayer::ipv4(
            "212.199.202.9".parse().unwrap(),
            "10.0.0.6".parse().unwrap(),
            0x4F4C,
            0x4000,
            59,
            6,
            &[],
        ));
        packet.add_layer(DetachedLayer::tcp(
            80,
            44160,
            0xb829cb98,
            0xe9771586,
            tcp::Flags::ACK | tcp::Flags::PSH,
            20178,
            0,
            &[tcp::TcpOption::Nop, tcp::TcpOption::Nop, tcp::TcpOption::Timestamp { value: 3555735960, echo: 196757 }],
        ));
        packet.add_layer(DetachedLayer::payload(vec![0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82]));
        packet.compute_calculate_fields();

        let ipv4_handle = packet.get_layer_of_type(ProtocolTag::Ipv4).unwrap();
        let ipv4_bytes = packet.layer_bytes(ipv4_handle).unwrap();
        assert_eq!(crate::checksum::internet_checksum(&[ipv4_bytes]), 0);

        let tcp_handle = packet.get_layer_of_type(ProtocolTag::Tcp).unwrap();
        let tcp_frame = tcp::TcpFrame::new(packet.layer_bytes(tcp_handle).unwrap());
        assert_eq!(tcp_frame.src_port(), 80);
        assert_eq!(tcp_frame.dst_port(), 44160);

        let raw = packet.get_raw_packet();
        assert_eq!(raw.len(), 14 + 20 + (20 + 12) + 9);
    }

    #[test]
    fn s3_udp_ipv4_checksum_preserved_on_reparse() {
        let mut builder = Packet::new(0);
        builder.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x0800));
        builder.add_layer(DetachedLayer::ipv4("10.0.0.6".parse().unwrap(), "10.0.0.7".parse().unwrap(), 1, 0, 64, 17, &[]));
        builder.add_layer(DetachedLayer::udp(5000, 6000));
        builder.add_layer(DetachedLayer::payload(vec![0xaa, 0xbb, 0xcc]));
        builder.compute_calculate_fields();
        let captured = builder.get_raw_packet().to_vec();

        let mut packet = Packet::from_raw(captured.clone(), Timestamp::ZERO);
        let before = {
            let handle = packet.get_layer_of_type(ProtocolTag::Udp).unwrap();
            udp::UdpFrame::new(packet.layer_bytes(handle).unwrap()).checksum()
        };
        packet.compute_calculate_fields();
        let after = {
            let handle = packet.get_layer_of_type(ProtocolTag::Udp).unwrap();
            udp::UdpFrame::new(packet.layer_bytes(handle).unwrap()).checksum()
        };
        assert_eq!(before, after);
        assert_eq!(packet.get_raw_packet(), captured.as_slice());
    }

    #[test]
    fn s4_ipv6_udp_round_trip() {
        let src: Ipv6Address = "fe80::4dc7:f593:1f7b:dc11".parse().unwrap();
        let dst: Ipv6Address = "ff02::c".parse().unwrap();
        let payload_bytes = vec![0u8; 146];

        let mut packet = Packet::new(0);
        packet.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x86dd));
        packet.add_layer(DetachedLayer::ipv6(src, dst, 0, 0, 255, 17));
        packet.add_layer(DetachedLayer::udp(63628, 1900));
        packet.add_layer(DetachedLayer::payload(payload_bytes.clone()));
        packet.compute_calculate_fields();

        let ipv6_handle = packet.get_layer_of_type(ProtocolTag::Ipv6).unwrap();
        let ipv6_frame = ipv6::Ipv6Frame::new(packet.layer_bytes(ipv6_handle).unwrap());
        assert_eq!(ipv6_frame.src_addr(), src);
        assert_eq!(ipv6_frame.dst_addr(), dst);
        assert_eq!(ipv6_frame.next_header(), 17);

        let udp_handle = packet.get_layer_of_type(ProtocolTag::Udp).unwrap();
        let udp_frame = udp::UdpFrame::new(packet.layer_bytes(udp_handle).unwrap());
        assert_eq!(udp_frame.dst_port(), 1900);
        assert_eq!(udp_frame.src_port(), 63628);
        assert_eq!(udp_frame.length() as usize, 8 + payload_bytes.len());

        let captured = packet.get_raw_packet().to_vec();
        let reparsed = Packet::from_raw(captured.clone(), Timestamp::ZERO);
        assert_eq!(reparsed.get_raw_packet(), captured.as_slice());
    }

    #[test]
    fn s5_insert_vlan_between_ethernet_and_ipv4() {
        let mut packet = Packet::new(0);
        packet.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x0800));
        let ipv4_src: Ipv4Address = "10.0.0.1".parse().unwrap();
        let ipv4_dst: Ipv4Address = "10.0.0.2".parse().unwrap();
        packet.add_layer(DetachedLayer::ipv4(ipv4_src, ipv4_dst, 0, 0, 64, 0xfd, &[]));
        packet.add_layer(DetachedLayer::payload(vec![1, 2, 3, 4]));
        packet.compute_calculate_fields();
        let len_before = packet.get_raw_packet().len();

        let eth_handle = packet.get_first_layer().unwrap();
        packet.insert_layer(Some(eth_handle), DetachedLayer::vlan(0, false, 100, 0x0800)).unwrap();
        packet.compute_calculate_fields();

        let first = packet.get_first_layer().unwrap();
        assert_eq!(packet.layer_tag(first), Some(ProtocolTag::Ethernet));
        let second = packet.get_next_layer_of_type(first, ProtocolTag::Vlan).unwrap();
        assert_eq!(packet.layer_tag(second), Some(ProtocolTag::Vlan));
        let third = packet.get_next_layer_of_type(second, ProtocolTag::Ipv4).unwrap();

        let ipv4_frame = ipv4::Ipv4Frame::new(packet.layer_bytes(third).unwrap());
        assert_eq!(ipv4_frame.src_addr(), ipv4_src);
        assert_eq!(ipv4_frame.dst_addr(), ipv4_dst);

        let raw = packet.get_raw_packet();
        assert_eq!(raw[raw.len() - 1], 0x04);
        assert_eq!(raw.len(), len_before + vlan::HEADER_LEN);
    }

    #[test]
    fn s6_remove_middle_layer() {
        let mut builder = Packet::new(0);
        builder.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x0800));
        builder.add_layer(DetachedLayer::ipv4("10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap(), 0, 0, 64, 6, &[]));
        builder.add_layer(DetachedLayer::tcp(1, 2, 0, 0, tcp::Flags::SYN, 0, 0, &[]));
        builder.compute_calculate_fields();
        let captured = builder.get_raw_packet().to_vec();
        let len_before = captured.len();

        let mut packet = Packet::from_raw(captured, Timestamp::ZERO);
        let ipv4_handle = packet.get_layer_of_type(ProtocolTag::Ipv4).unwrap();
        packet.remove_layer(ipv4_handle).unwrap();

        let first = packet.get_first_layer().unwrap();
        assert_eq!(packet.layer_tag(first), Some(ProtocolTag::Ethernet));
        let second = packet.get_next_layer_of_type(first, ProtocolTag::Tcp).unwrap();
        assert_eq!(packet.layer_tag(second), Some(ProtocolTag::Tcp));
        assert!(!packet.is_packet_of_type(ProtocolTag::Ipv4));
        assert_eq!(packet.get_raw_packet().len(), len_before - ipv4::MIN_HEADER_LEN);
    }

    #[test]
    fn insert_layer_rejects_foreign_handle() {
        let mut a = Packet::new(0);
        a.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x0800));
        let handle_from_a = a.get_first_layer().unwrap();

        let mut b = Packet::new(0);
        b.add_layer(DetachedLayer::ethernet(mac(3), mac(4), 0x0800));
        let result = b.insert_layer(Some(handle_from_a), DetachedLayer::payload(vec![9]));
        assert_eq!(result.unwrap_err(), Error::OwnershipConflict);
    }

    #[test]
    fn remove_layer_rejects_unknown_handle() {
        let mut a = Packet::new(0);
        a.add_layer(DetachedLayer::ethernet(mac(1), mac(2), 0x0800));

        let mut b = Packet::new(0);
        let result = b.remove_layer(a.get_first_layer().unwrap());
        assert_eq!(result.unwrap_err(), Error::NotFound);
    }
}
