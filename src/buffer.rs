//! The raw, contiguous byte buffer a [`crate::Packet`] is built on top of.

use crate::no_std_prelude::Vec;

/// A capture timestamp, seconds and microseconds since the Unix epoch.
///
/// Carried alongside the raw bytes because it is an attribute of *capturing* a frame, not of any
/// one protocol layer within it; a constructed-from-scratch packet defaults to the zero
/// timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Microseconds within the second.
    pub microseconds: u32,
}

impl Timestamp {
    /// The zero timestamp, used for packets that were never "captured" anywhere.
    pub const ZERO: Timestamp = Timestamp { seconds: 0, microseconds: 0 };

    /// Build a timestamp from components.
    pub fn new(seconds: i64, microseconds: u32) -> Self {
        Timestamp { seconds, microseconds }
    }
}

/// An owned, contiguous, resizeable byte buffer plus its capture timestamp.
///
/// All layer windows in a [`crate::Packet`] address into this buffer by offset; only the owning
/// `Packet` ever changes its length (§3, §9 of the design notes: offsets are resolved at access
/// time rather than cached as pointers, so there is nothing to rebind here).
#[derive(Clone, Debug, Default)]
pub struct RawBuffer {
    data: Vec<u8>,
    timestamp: Timestamp,
}

impl RawBuffer {
    /// An empty buffer with at least `capacity` bytes of backing storage reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        RawBuffer {
            data: Vec::with_capacity(capacity),
            timestamp: Timestamp::ZERO,
        }
    }

    /// Take ownership of already-captured bytes and their timestamp.
    pub fn from_vec(data: Vec<u8>, timestamp: Timestamp) -> Self {
        RawBuffer { data, timestamp }
    }

    /// The buffer contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The buffer contents, mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The capture timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Set the capture timestamp.
    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Append `bytes` to the end of the buffer, growing it.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Insert `bytes` at `offset`, shifting everything from `offset` onward to the right.
    ///
    /// Panics if `offset > self.len()`; that would be a bug in the caller (only `Packet`
    /// computes offsets, and only ever from its own layer-entry list).
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) {
        assert!(offset <= self.data.len(), "insert offset out of bounds");
        self.data.splice(offset..offset, bytes.iter().copied());
    }

    /// Remove `len` bytes starting at `offset`, shifting the remainder left.
    ///
    /// Panics if the range is out of bounds.
    pub fn remove(&mut self, offset: usize, len: usize) {
        assert!(offset + len <= self.data.len(), "remove range out of bounds");
        self.data.drain(offset..offset + len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_the_buffer() {
        let mut buf = RawBuffer::with_capacity(4);
        buf.append(&[1, 2, 3]);
        assert_eq!(buf.data(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn insert_shifts_tail_right() {
        let mut buf = RawBuffer::from_vec(vec![1, 2, 5, 6], Timestamp::ZERO);
        buf.insert(2, &[3, 4]);
        assert_eq!(buf.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn remove_shifts_tail_left() {
        let mut buf = RawBuffer::from_vec(vec![1, 2, 3, 4, 5, 6], Timestamp::ZERO);
        buf.remove(2, 2);
        assert_eq!(buf.data(), &[1, 2, 5, 6]);
    }
}
