//! Per-protocol wire codecs.
//!
//! Every codec here follows the same shape: an `XxxFrame<T>` wrapper generic over the buffer it
//! borrows (`T: AsRef<[u8]>` for read accessors, with a second `impl` block requiring
//! `AsMut<[u8]>` for writers), plus a free `parse_step` function the [`crate::packet::Packet`]
//! uses to walk the chain. Each module additionally exposes a builder that assembles a detached
//! layer's bytes from typed fields.

pub mod arp;
pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod payload;
pub mod tcp;
pub mod udp;
pub mod vlan;

use crate::tag::ProtocolTag;

/// What a layer's header says should happen next, as seen by [`crate::packet::Packet::from_raw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParseOutcome {
    /// This layer is `local_len` bytes; a further layer of the given tag follows.
    Continue { local_len: usize, next: ProtocolTag },
    /// This layer is `local_len` bytes; nothing recognizable follows (captured verbatim as
    /// `Payload` by the caller if bytes remain).
    Terminal { local_len: usize },
    /// The header claims more bytes than are available. The caller ends the chain with a
    /// `Payload` layer over whatever residual bytes remain (§7: `Truncated` is tolerated, not an
    /// `Err`).
    Truncated,
}

/// The IP protocol number identifying the next header, shared between IPv4's `protocol` field
/// and IPv6's `next_header` field. `None` for a tag with no assigned number (`Payload`,
/// `Unknown`) — the caller leaves the field at whatever value was explicitly built in, since an
/// opaque trailer doesn't imply any particular upper-layer protocol.
pub(crate) fn protocol_number_for(tag: ProtocolTag) -> Option<u8> {
    match tag {
        ProtocolTag::Tcp => Some(6),
        ProtocolTag::Udp => Some(17),
        _ => None,
    }
}

/// The next layer implied by an IP protocol number (inverse of [`protocol_number_for`] for the
/// two tags IPv4/IPv6 know how to recurse into).
pub(crate) fn tag_for_protocol_number(value: u8) -> Option<ProtocolTag> {
    match value {
        6 => Some(ProtocolTag::Tcp),
        17 => Some(ProtocolTag::Udp),
        _ => None,
    }
}

/// The Ethernet/VLAN ethertype identifying the next header. `None` for a tag with no assigned
/// ethertype (`Payload`, `Unknown`) — the caller leaves the field at whatever value was
/// explicitly built in.
pub(crate) fn ethertype_for(tag: ProtocolTag) -> Option<u16> {
    match tag {
        ProtocolTag::Ipv4 => Some(0x0800),
        ProtocolTag::Ipv6 => Some(0x86dd),
        ProtocolTag::Arp => Some(0x0806),
        ProtocolTag::Vlan => Some(0x8100),
        _ => None,
    }
}

/// The next layer implied by an ethertype (inverse of [`ethertype_for`]).
pub(crate) fn tag_for_ethertype(value: u16) -> Option<ProtocolTag> {
    match value {
        0x0800 => Some(ProtocolTag::Ipv4),
        0x86dd => Some(ProtocolTag::Ipv6),
        0x0806 => Some(ProtocolTag::Arp),
        0x8100 => Some(ProtocolTag::Vlan),
        _ => None,
    }
}
