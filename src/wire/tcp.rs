//! TCP: a 20-byte base header, typed options padded to a 4-byte boundary, and the pseudo-header
//! checksum shared with UDP.

use byteorder::{BigEndian, ByteOrder};

use crate::checksum::internet_checksum;
use crate::no_std_prelude::Vec;
use crate::wire::ipv4::Ipv4Frame;
use crate::wire::ipv6::Ipv6Frame;

/// Byte length of the TCP base header (no options).
pub const MIN_HEADER_LEN: usize = 20;

/// IP protocol number for TCP, used in both pseudo-header shapes.
const PROTO_TCP: u8 = 6;

const SRC_PORT: core::ops::Range<usize> = 0..2;
const DST_PORT: core::ops::Range<usize> = 2..4;
const SEQ: core::ops::Range<usize> = 4..8;
const ACK: core::ops::Range<usize> = 8..12;
const DATA_OFFSET_RESERVED: usize = 12;
const FLAGS: usize = 13;
const WINDOW: core::ops::Range<usize> = 14..16;
const CHECKSUM: core::ops::Range<usize> = 16..18;
const URGENT_PTR: core::ops::Range<usize> = 18..20;

/// A tiny bitflags-like macro, kept local and minimal rather than pulling in the `bitflags` crate
/// for a single 9-bit set.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
        pub struct $name(pub $ty);

        impl $name {
            $(
                #[allow(missing_docs)]
                pub const $flag: $name = $name($value);
            )*

            /// The empty flag set.
            pub const NONE: $name = $name(0);

            /// Combine with another flag set.
            pub const fn or(self, other: $name) -> $name {
                $name(self.0 | other.0)
            }

            /// Whether `other`'s bits are all set in `self`.
            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl core::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                self.or(rhs)
            }
        }
    };
}

bitflags_like! {
    /// The 9 TCP control bits, the low 8 of which share the `FLAGS` byte and the 9th (`NS`) of
    /// which lives in the low bit of the data-offset/reserved byte.
    pub struct Flags: u16 {
        const FIN = 1 << 0;
        const SYN = 1 << 1;
        const RST = 1 << 2;
        const PSH = 1 << 3;
        const ACK = 1 << 4;
        const URG = 1 << 5;
        const ECE = 1 << 6;
        const CWR = 1 << 7;
        const NS  = 1 << 8;
    }
}

/// A recognized TCP option, with arity enforced by construction rather than by a raw
/// kind/length/bytes triple (the redesign the design notes call for, §9 of SPEC_FULL.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TcpOption {
    /// Explicit end-of-options marker (kind 0). Inserted automatically by [`build`] when padding
    /// requires it; rarely constructed directly.
    End,
    /// No-operation padding byte (kind 1).
    Nop,
    /// Maximum segment size (kind 2, 4 bytes total).
    Mss(u16),
    /// Window scale shift count (kind 3, 3 bytes total).
    WindowScale(u8),
    /// Selective ACK permitted (kind 4, 2 bytes total).
    SackPermitted,
    /// Timestamp value and echo reply (kind 8, 10 bytes total).
    Timestamp { value: u32, echo: u32 },
}

/// TCP option kind numbers, per IANA.
pub mod kind {
    /// [`super::TcpOption::End`].
    pub const END: u8 = 0;
    /// [`super::TcpOption::Nop`].
    pub const NOP: u8 = 1;
    /// [`super::TcpOption::Mss`].
    pub const MSS: u8 = 2;
    /// [`super::TcpOption::WindowScale`].
    pub const WINDOW: u8 = 3;
    /// [`super::TcpOption::SackPermitted`].
    pub const SACK_PERM: u8 = 4;
    /// [`super::TcpOption::Timestamp`].
    pub const TIMESTAMP: u8 = 8;
}

impl TcpOption {
    fn encoded_len(self) -> usize {
        match self {
            TcpOption::End | TcpOption::Nop => 1,
            TcpOption::Mss(_) => 4,
            TcpOption::WindowScale(_) => 3,
            TcpOption::SackPermitted => 2,
            TcpOption::Timestamp { .. } => 10,
        }
    }

    fn write(self, out: &mut Vec<u8>) {
        match self {
            TcpOption::End => out.push(kind::END),
            TcpOption::Nop => out.push(kind::NOP),
            TcpOption::Mss(mss) => {
                out.push(kind::MSS);
                out.push(4);
                let mut buf = [0u8; 2];
                BigEndian::write_u16(&mut buf, mss);
                out.extend_from_slice(&buf);
            }
            TcpOption::WindowScale(shift) => {
                out.push(kind::WINDOW);
                out.push(3);
                out.push(shift);
            }
            TcpOption::SackPermitted => {
                out.push(kind::SACK_PERM);
                out.push(2);
            }
            TcpOption::Timestamp { value, echo } => {
                out.push(kind::TIMESTAMP);
                out.push(10);
                let mut buf = [0u8; 4];
                BigEndian::write_u32(&mut buf, value);
                out.extend_from_slice(&buf);
                BigEndian::write_u32(&mut buf, echo);
                out.extend_from_slice(&buf);
            }
        }
    }
}

/// A read/write view of a TCP header (base + options) over some buffer `T`.
#[derive(Clone, Copy, Debug)]
pub struct TcpFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> TcpFrame<T> {
    /// Wrap `buffer`, which must be at least [`MIN_HEADER_LEN`] bytes.
    pub fn new(buffer: T) -> Self {
        TcpFrame { buffer }
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

    /// Sequence number.
    pub fn sequence(&self) -> u32 {
        BigEndian::read_u32(&self.bytes()[SEQ])
    }

    /// Acknowledgment number.
    pub fn ack(&self) -> u32 {
        BigEndian::read_u32(&self.bytes()[ACK])
    }

    /// Data offset in 32-bit words (header length / 4, including options).
    pub fn data_offset(&self) -> u8 {
        self.bytes()[DATA_OFFSET_RESERVED] >> 4
    }

    /// The header length in bytes (`data_offset * 4`).
    pub fn header_len(&self) -> usize {
        self.data_offset() as usize * 4
    }

    /// The 9 control bits.
    pub fn flags(&self) -> Flags {
        let ns = self.bytes()[DATA_OFFSET_RESERVED] & 0x1;
        let low8 = self.bytes()[FLAGS];
        Flags(((ns as u16) << 8) | low8 as u16)
    }

    /// Receive window.
    pub fn window(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[WINDOW])
    }

    /// Checksum field as stored (not recomputed).
    pub fn checksum(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[CHECKSUM])
    }

    /// Urgent pointer.
    pub fn urgent_ptr(&self) -> u16 {
        BigEndian::read_u16(&self.bytes()[URGENT_PTR])
    }

    /// The raw option bytes beyond the fixed 20-byte header.
    pub fn options(&self) -> &[u8] {
        &self.bytes()[MIN_HEADER_LEN..self.header_len()]
    }

    /// Iterate the decoded options, stopping early (without error) at the first malformed TLV —
    /// per §7, a bad option length is tolerated, not fatal, and just ends enumeration.
    pub fn iter_options(&self) -> TcpOptionIter<'_> {
        TcpOptionIter { remaining: self.options(), malformed: false }
    }

    /// The number of options that parse successfully before any malformed TLV.
    pub fn option_count(&self) -> usize {
        self.iter_options().count()
    }

    /// Find the first option matching `kind`, if any parses successfully before a malformed TLV.
    pub fn option_by_kind(&self, kind: u8) -> Option<TcpOption> {
        self.iter_options().find(|opt| option_kind(*opt) == kind)
    }
}

fn option_kind(opt: TcpOption) -> u8 {
    match opt {
        TcpOption::End => kind::END,
        TcpOption::Nop => kind::NOP,
        TcpOption::Mss(_) => kind::MSS,
        TcpOption::WindowScale(_) => kind::WINDOW,
        TcpOption::SackPermitted => kind::SACK_PERM,
        TcpOption::Timestamp { .. } => kind::TIMESTAMP,
    }
}

/// Iterator over the options in a TCP header's option bytes.
///
/// Stops (without error) at the first TLV whose declared length is inconsistent with the
/// remaining bytes, per the `MalformedOption` tolerance in §7.
pub struct TcpOptionIter<'a> {
    remaining: &'a [u8],
    malformed: bool,
}

impl<'a> Iterator for TcpOptionIter<'a> {
    type Item = TcpOption;

    fn next(&mut self) -> Option<TcpOption> {
        if self.malformed {
            return None;
        }
        let (&first, rest) = self.remaining.split_first()?;
        match first {
            kind::END => {
                self.remaining = &[];
                Some(TcpOption::End)
            }
            kind::NOP => {
                self.remaining = rest;
                Some(TcpOption::Nop)
            }
            k => {
                let (&len, rest) = match rest.split_first() {
                    Some(pair) => pair,
                    None => {
                        self.malformed = true;
                        return None;
                    }
                };
                let value_len = (len as usize).checked_sub(2);
                let value_len = match value_len {
                    Some(v) if v <= rest.len() => v,
                    _ => {
                        self.malformed = true;
                        return None;
                    }
                };
                let (value, tail) = rest.split_at(value_len);
                let option = match (k, value_len) {
                    (kind::MSS, 2) => TcpOption::Mss(BigEndian::read_u16(value)),
                    (kind::WINDOW, 1) => TcpOption::WindowScale(value[0]),
                    (kind::SACK_PERM, 0) => TcpOption::SackPermitted,
                    (kind::TIMESTAMP, 8) => TcpOption::Timestamp {
                        value: BigEndian::read_u32(&value[0..4]),
                        echo: BigEndian::read_u32(&value[4..8]),
                    },
                    _ => {
                        self.malformed = true;
                        return None;
                    }
                };
                self.remaining = tail;
                Some(option)
            }
        }
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> TcpFrame<T> {
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

    /// Set the sequence number.
    pub fn set_sequence(&mut self, value: u32) {
        BigEndian::write_u32(&mut self.bytes_mut()[SEQ], value);
    }

    /// Set the acknowledgment number.
    pub fn set_ack(&mut self, value: u32) {
        BigEndian::write_u32(&mut self.bytes_mut()[ACK], value);
    }

    /// Set the data offset (in 32-bit words) and the NS flag bit that shares its byte.
    pub fn set_data_offset(&mut self, words: u8) {
        let ns = self.bytes_mut()[DATA_OFFSET_RESERVED] & 0x1;
        self.bytes_mut()[DATA_OFFSET_RESERVED] = (words << 4) | ns;
    }

    /// Set all 9 control bits.
    pub fn set_flags(&mut self, flags: Flags) {
        let ns = ((flags.0 >> 8) & 0x1) as u8;
        self.bytes_mut()[DATA_OFFSET_RESERVED] =
            (self.bytes_mut()[DATA_OFFSET_RESERVED] & 0xf0) | ns;
        self.bytes_mut()[FLAGS] = flags.0 as u8;
    }

    /// Set the receive window.
    pub fn set_window(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[WINDOW], value);
    }

    /// Set the checksum field.
    pub fn set_checksum(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[CHECKSUM], value);
    }

    /// Set the urgent pointer.
    pub fn set_urgent_ptr(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.bytes_mut()[URGENT_PTR], value);
    }
}

/// Encode `options` and pad to a 4-byte boundary with trailing NOPs, per §4.11.
fn encode_options(options: &[TcpOption]) -> Vec<u8> {
    let mut out = Vec::new();
    for &opt in options {
        opt.write(&mut out);
    }
    while out.len() % 4 != 0 {
        out.push(kind::NOP);
    }
    out
}

/// Build a detached TCP header's bytes (base header + encoded, padded options).
#[allow(clippy::too_many_arguments)]
pub fn build(
    src_port: u16,
    dst_port: u16,
    sequence: u32,
    ack: u32,
    flags: Flags,
    window: u16,
    urgent_ptr: u16,
    options: &[TcpOption],
) -> Vec<u8> {
    let option_bytes = encode_options(options);
    let header_len = MIN_HEADER_LEN + option_bytes.len();
    assert_eq!(header_len % 4, 0, "encode_options must always pad to a 4-byte boundary");
    let data_offset = (header_len / 4) as u8;

    let mut bytes = vec![0u8; header_len];
    bytes[MIN_HEADER_LEN..].copy_from_slice(&option_bytes);

    let mut frame = TcpFrame::new(&mut bytes[..]);
    frame.set_src_port(src_port);
    frame.set_dst_port(dst_port);
    frame.set_sequence(sequence);
    frame.set_ack(ack);
    frame.set_data_offset(data_offset);
    frame.set_flags(flags);
    frame.set_window(window);
    frame.set_urgent_ptr(urgent_ptr);
    bytes
}

/// Inspect `remaining` and decide what follows; TCP always hands off to `Payload` if bytes
/// remain, and has no next layer otherwise.
pub(crate) fn parse_step(remaining: &[u8]) -> super::ParseOutcome {
    if remaining.len() < MIN_HEADER_LEN {
        return super::ParseOutcome::Truncated;
    }
    let frame = TcpFrame::new(remaining);
    let header_len = frame.header_len();
    if header_len < MIN_HEADER_LEN || remaining.len() < header_len {
        return super::ParseOutcome::Truncated;
    }
    if remaining.len() > header_len {
        super::ParseOutcome::Continue { local_len: header_len, next: crate::tag::ProtocolTag::Payload }
    } else {
        super::ParseOutcome::Terminal { local_len: header_len }
    }
}

/// The pseudo-header bytes prepended to the checksum calculation, mirroring [`super::udp`]'s.
pub(crate) enum PseudoHeader<'a> {
    /// IPv4 previous layer.
    V4 { ip: Ipv4Frame<&'a [u8]> },
    /// IPv6 previous layer.
    V6 { ip: Ipv6Frame<&'a [u8]> },
}

/// Recompute the TCP checksum over `segment` (this layer's header plus everything after it)
/// using the same pseudo-header construction as UDP but with protocol number 6. Unlike UDP, a
/// computed-zero checksum is transmitted as literal zero: TCP has no reserved all-ones sentinel
/// for "no checksum computed".
pub(crate) fn compute_fields(segment: &mut [u8], pseudo: Option<PseudoHeader<'_>>) {
    {
        let mut frame = TcpFrame::new(&mut *segment);
        frame.set_checksum(0);
    }

    let pseudo = match pseudo {
        Some(pseudo) => pseudo,
        None => return,
    };

    let segment_len = segment.len() as u32;
    let checksum = match pseudo {
        PseudoHeader::V4 { ip } => {
            let src = ip.src_addr().to_int();
            let dst = ip.dst_addr().to_int();
            let header = [
                (src >> 16) as u16,
                src as u16,
                (dst >> 16) as u16,
                dst as u16,
                PROTO_TCP as u16,
                segment_len as u16,
            ];
            let mut header_bytes = [0u8; 12];
            for (chunk, word) in header_bytes.chunks_exact_mut(2).zip(header.iter()) {
                BigEndian::write_u16(chunk, *word);
            }
            internet_checksum(&[&header_bytes, segment])
        }
        PseudoHeader::V6 { ip } => {
            let mut header_bytes = [0u8; 40];
            ip.src_addr().copy_to(&mut header_bytes[0..16]);
            ip.dst_addr().copy_to(&mut header_bytes[16..32]);
            BigEndian::write_u32(&mut header_bytes[32..36], segment_len);
            header_bytes[39] = PROTO_TCP;
            internet_checksum(&[&header_bytes, segment])
        }
    };

    TcpFrame::new(segment).set_checksum(checksum);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_read_back_base_fields() {
        let bytes = build(80, 44160, 0xb829cb98, 0xe9771586, Flags::ACK | Flags::PSH, 20178, 0, &[]);
        let frame = TcpFrame::new(&bytes[..]);
        assert_eq!(frame.src_port(), 80);
        assert_eq!(frame.dst_port(), 44160);
        assert_eq!(frame.sequence(), 0xb829cb98);
        assert_eq!(frame.ack(), 0xe9771586);
        assert!(frame.flags().contains(Flags::ACK));
        assert!(frame.flags().contains(Flags::PSH));
        assert!(!frame.flags().contains(Flags::SYN));
        assert_eq!(frame.window(), 20178);
        assert_eq!(frame.header_len(), MIN_HEADER_LEN);
    }

    #[test]
    fn options_are_padded_to_four_bytes_and_decode() {
        let options = [
            TcpOption::Nop,
            TcpOption::Nop,
            TcpOption::Timestamp { value: 3555735960, echo: 196757 },
        ];
        let bytes = build(80, 44160, 0, 0, Flags::ACK, 0, 0, &options);
        let frame = TcpFrame::new(&bytes[..]);
        assert_eq!(frame.header_len() % 4, 0);
        assert_eq!(frame.header_len(), MIN_HEADER_LEN + 12);

        let decoded: Vec<TcpOption> = frame.iter_options().collect();
        assert_eq!(decoded, options);
        assert_eq!(frame.option_count(), 3);
        assert_eq!(
            frame.option_by_kind(kind::TIMESTAMP),
            Some(TcpOption::Timestamp { value: 3555735960, echo: 196757 })
        );
    }

    #[test]
    fn malformed_option_stops_enumeration_without_panicking() {
        let mut bytes = build(1, 2, 0, 0, Flags::NONE, 0, 0, &[TcpOption::Mss(1460)]);
        // Corrupt the MSS option's length byte to claim more bytes than remain.
        bytes[MIN_HEADER_LEN + 1] = 0xff;
        let frame = TcpFrame::new(&bytes[..]);
        assert_eq!(frame.iter_options().count(), 0);
    }

    #[test]
    fn flags_are_packed_into_shared_bytes() {
        let mut bytes = build(1, 2, 0, 0, Flags::SYN | Flags::NS, 0, 0, &[]);
        let frame = TcpFrame::new(&mut bytes[..]);
        assert!(frame.flags().contains(Flags::SYN));
        assert!(frame.flags().contains(Flags::NS));
        assert!(!frame.flags().contains(Flags::FIN));
    }
}
