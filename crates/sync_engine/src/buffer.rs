//! Bounded receive buffer.
//!
//! Bytes leave the front only through `consume` (decoded or skipped by the
//! synchronizer) or through the forced discard in `extend`, which keeps the
//! length at or below `max_len`.

use std::fmt;

use bytes::{Buf, BytesMut};

/// Single-owner byte accumulator for one assembler
pub struct ReceiveBuffer {
    data: BytesMut,
    max_len: usize,
}

impl fmt::Debug for ReceiveBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiveBuffer")
            .field("len", &self.data.len())
            .field("max_len", &self.max_len)
            .finish()
    }
}

impl ReceiveBuffer {
    /// Create an empty buffer holding at most `max_len` bytes
    #[inline]
    pub fn new(max_len: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(max_len),
            max_len,
        }
    }

    /// Append `chunk`, force-discarding leading bytes past the bound
    ///
    /// Stale bytes already buffered go first; if the chunk alone exceeds the
    /// bound only its tail is kept. Returns the number of bytes dropped.
    #[inline]
    pub fn extend(&mut self, chunk: &[u8]) -> usize {
        let total = self.data.len() + chunk.len();
        if total <= self.max_len {
            self.data.extend_from_slice(chunk);
            return 0;
        }

        let overflow = total - self.max_len;
        let from_buffer = overflow.min(self.data.len());
        self.data.advance(from_buffer);

        let from_chunk = overflow - from_buffer;
        self.data.extend_from_slice(&chunk[from_chunk..]);
        overflow
    }

    /// Drop `n` bytes from the front
    #[inline]
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.data.len());
        self.data.advance(n);
    }

    /// Buffered bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Configured bound
    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_within_bound() {
        let mut buffer = ReceiveBuffer::new(8);

        assert_eq!(buffer.extend(&[1, 2, 3]), 0);
        assert_eq!(buffer.extend(&[4, 5]), 0);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_overflow_drops_stale_bytes_first() {
        let mut buffer = ReceiveBuffer::new(6);

        buffer.extend(&[1, 2, 3, 4]);
        let dropped = buffer.extend(&[5, 6, 7, 8]);

        assert_eq!(dropped, 2);
        assert_eq!(buffer.as_slice(), &[3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_oversized_chunk_keeps_tail() {
        let mut buffer = ReceiveBuffer::new(4);

        buffer.extend(&[1, 2]);
        let dropped = buffer.extend(&[3, 4, 5, 6, 7, 8]);

        assert_eq!(dropped, 4);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.as_slice(), &[5, 6, 7, 8]);
    }

    #[test]
    fn test_consume() {
        let mut buffer = ReceiveBuffer::new(16);

        buffer.extend(&[1, 2, 3, 4]);
        buffer.consume(3);
        assert_eq!(buffer.as_slice(), &[4]);

        buffer.consume(10);
        assert!(buffer.is_empty());
    }
}
