//! An opaque trailer: whatever bytes remain once no further header can be recognized.

use crate::wire::ParseOutcome;

/// A read-only view of an opaque payload: every remaining byte, uninterpreted.
#[derive(Clone, Copy, Debug)]
pub struct PayloadFrame<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> PayloadFrame<T> {
    /// Wrap `buffer` in its entirety as payload.
    pub fn new(buffer: T) -> Self {
        PayloadFrame { buffer }
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

/// Payload never recurses further; it always consumes everything remaining.
pub(crate) fn parse_step(remaining: &[u8]) -> ParseOutcome {
    ParseOutcome::Terminal { local_len: remaining.len() }
}

/// Payload has no header fields to finalize.
pub(crate) fn compute_fields(_bytes: &mut [u8]) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_everything_remaining() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(parse_step(&data), ParseOutcome::Terminal { local_len: 4 });
        assert_eq!(PayloadFrame::new(&data[..]).bytes(), &data);
    }

    #[test]
    fn empty_residual_is_still_terminal() {
        assert_eq!(parse_step(&[]), ParseOutcome::Terminal { local_len: 0 });
    }
}
