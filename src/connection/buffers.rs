//! Network-in / network-out ciphertext queues
//!
//! The two queues replace the socket. The caller appends what arrived from the
//! peer to `incoming` and removes what must be sent from `outgoing`; the engine
//! moves bytes between the queues and the rustls session.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;

/// Initial capacity of each queue; both grow on demand
const INITIAL_CAPACITY: usize = 8192;

/// Pair of ciphertext queues owned by one connection
#[derive(Debug)]
pub(crate) struct BufferPair {
    incoming: BytesMut,
    outgoing: BytesMut,
}

impl BufferPair {
    pub(crate) fn new() -> Self {
        Self {
            incoming: BytesMut::with_capacity(INITIAL_CAPACITY),
            outgoing: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append bytes received from the peer. The whole slice is always accepted.
    pub(crate) fn feed(&mut self, data: &[u8]) -> usize {
        self.incoming.extend_from_slice(data);
        data.len()
    }

    /// Remove up to `max_len` bytes destined for the peer, oldest first.
    pub(crate) fn drain(&mut self, max_len: usize) -> Bytes {
        let n = max_len.min(self.outgoing.len());
        self.outgoing.split_to(n).freeze()
    }

    pub(crate) fn pending_in(&self) -> usize {
        self.incoming.len()
    }

    pub(crate) fn pending_out(&self) -> usize {
        self.outgoing.len()
    }

    /// Hand buffered ciphertext to the session. Returns the bytes consumed.
    pub(crate) fn ingest(&mut self, session: &mut rustls::Connection) -> io::Result<usize> {
        let mut reader = &self.incoming[..];
        let n = session.read_tls(&mut reader)?;
        self.incoming.advance(n);
        Ok(n)
    }

    /// Move every pending TLS record from the session into `outgoing`.
    pub(crate) fn flush(&mut self, session: &mut rustls::Connection) -> io::Result<usize> {
        let mut written = 0;
        let mut writer = (&mut self.outgoing).writer();
        while session.wants_write() {
            written += session.write_tls(&mut writer)?;
        }
        Ok(written)
    }

    /// Drop everything still queued in either direction.
    pub(crate) fn clear(&mut self) {
        self.incoming.clear();
        self.outgoing.clear();
    }
}

impl Default for BufferPair {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let buffers = BufferPair::new();
        assert_eq!(buffers.pending_in(), 0);
        assert_eq!(buffers.pending_out(), 0);
    }

    #[test]
    fn test_feed_accepts_everything() {
        let mut buffers = BufferPair::new();
        assert_eq!(buffers.feed(b"hello"), 5);
        assert_eq!(buffers.feed(b""), 0);
        assert_eq!(buffers.feed(&[0u8; 20_000]), 20_000);
        assert_eq!(buffers.pending_in(), 20_005);
    }

    #[test]
    fn test_drain_empty() {
        let mut buffers = BufferPair::new();
        let out = buffers.drain(1024);
        assert!(out.is_empty());
        assert_eq!(buffers.pending_out(), 0);
    }

    #[test]
    fn test_drain_is_fifo_and_bounded() {
        let mut buffers = BufferPair::new();
        buffers.outgoing.extend_from_slice(b"abcdef");

        assert_eq!(&buffers.drain(2)[..], b"ab");
        assert_eq!(buffers.pending_out(), 4);
        assert_eq!(&buffers.drain(100)[..], b"cdef");
        assert_eq!(buffers.pending_out(), 0);
        assert!(buffers.drain(0).is_empty());
    }

    #[test]
    fn test_pending_does_not_mutate() {
        let mut buffers = BufferPair::new();
        buffers.feed(b"xyz");
        assert_eq!(buffers.pending_in(), 3);
        assert_eq!(buffers.pending_in(), 3);
    }

    #[test]
    fn test_clear() {
        let mut buffers = BufferPair::new();
        buffers.feed(b"in");
        buffers.outgoing.extend_from_slice(b"out");
        buffers.clear();
        assert_eq!(buffers.pending_in(), 0);
        assert_eq!(buffers.pending_out(), 0);
    }
}
