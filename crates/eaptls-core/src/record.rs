//! Per-session byte stores.
//!
//! [`RecordBuffer`] accumulates inbound fragments until a whole TLS message
//! has arrived. [`OutboundBuffer`] holds what the engine produced and is
//! drained front to back, one fragment per round.

use bytes::{Bytes, BytesMut};

/// Bounded inbound reassembly buffer.
#[derive(Debug, Clone)]
pub struct RecordBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl RecordBuffer {
    /// Empty buffer that will hold at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { buf: BytesMut::new(), capacity }
    }

    /// Append a fragment.
    ///
    /// All or nothing: if `data` does not fit, nothing is kept and `0` is
    /// returned. Callers compare the result with `data.len()`.
    pub fn append(&mut self, data: &[u8]) -> usize {
        if data.len() > self.remaining() {
            return 0;
        }
        self.buf.extend_from_slice(data);
        data.len()
    }

    /// Room left before the capacity is reached.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Accumulated bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Take everything, leaving the buffer empty for the next burst.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// FIFO of bytes waiting to be fragmented out.
#[derive(Debug, Clone, Default)]
pub struct OutboundBuffer {
    buf: BytesMut,
}

impl OutboundBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes behind whatever is already pending.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes still pending.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remove and return up to `n` bytes from the front.
    pub fn consume(&mut self, n: usize) -> Bytes {
        let n = n.min(self.buf.len());
        self.buf.split_to(n).freeze()
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_within_capacity() {
        let mut buf = RecordBuffer::new(8);
        assert_eq!(buf.append(&[1, 2, 3]), 3);
        assert_eq!(buf.append(&[4, 5]), 2);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(buf.remaining(), 3);
    }

    #[test]
    fn append_past_capacity_keeps_nothing() {
        let mut buf = RecordBuffer::new(4);
        buf.append(&[1, 2, 3]);
        assert_eq!(buf.append(&[4, 5]), 0);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn take_resets_for_next_burst() {
        let mut buf = RecordBuffer::new(4);
        buf.append(&[1, 2, 3, 4]);
        assert_eq!(&buf.take()[..], &[1, 2, 3, 4]);
        assert!(buf.is_empty());
        assert_eq!(buf.append(&[9, 9, 9, 9]), 4);
    }

    #[test]
    fn outbound_consumes_front_to_back() {
        let mut out = OutboundBuffer::new();
        out.extend(&[1, 2, 3]);
        out.extend(&[4, 5]);
        assert_eq!(&out.consume(2)[..], &[1, 2]);
        assert_eq!(&out.consume(10)[..], &[3, 4, 5]);
        assert!(out.is_empty());
        assert!(out.consume(1).is_empty());
    }
}
