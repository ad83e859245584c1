//! Outbound fragmentation.
//!
//! A burst is everything the engine produced for one flight. It leaves in
//! `mtu`-sized pieces, one per round, each acknowledged by the peer before
//! the next goes out. The first piece of a fragmented burst always carries
//! the burst's total length; later pieces carry it only when the listener
//! is configured to include it everywhere.

use eaptls_proto::{TlsFlags, TlsReply};
use tracing::debug;

use crate::record::OutboundBuffer;

/// Fragmentation cursor for one session.
#[derive(Debug, Clone)]
pub struct Fragmenter {
    mtu: usize,
    include_length: bool,
    passthrough: TlsFlags,
    in_progress: bool,
    burst_total_len: u32,
}

impl Fragmenter {
    /// New cursor for fragments of at most `mtu` payload bytes.
    pub fn new(mtu: usize, include_length: bool, passthrough: TlsFlags) -> Self {
        Self { mtu, include_length, passthrough: passthrough.passthrough(), in_progress: false, burst_total_len: 0 }
    }

    /// Whether a burst is part way out.
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Total length of the current (or last) burst.
    pub fn burst_total_len(&self) -> u32 {
        self.burst_total_len
    }

    /// Maximum payload bytes per fragment.
    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Cut the next fragment off the front of `out`.
    pub fn next_fragment(&mut self, out: &mut OutboundBuffer) -> TlsReply {
        let mut include_length = self.include_length;
        if !self.in_progress {
            self.burst_total_len = out.remaining() as u32;
        }

        let mut flags = self.passthrough;
        let size = if out.remaining() > self.mtu {
            flags |= TlsFlags::MORE_FRAGMENTS;
            if !self.in_progress {
                include_length = true;
            }
            self.in_progress = true;
            self.mtu
        } else {
            self.in_progress = false;
            out.remaining()
        };

        let fragment = out.consume(size);
        debug!(
            size,
            total = self.burst_total_len,
            more = self.in_progress,
            remaining = out.remaining(),
            "sending TLS record fragment"
        );

        let total_len = include_length.then_some(self.burst_total_len);
        TlsReply::request(flags, total_len, &fragment)
    }

    /// Forget any burst in progress.
    pub fn reset(&mut self) {
        self.in_progress = false;
        self.burst_total_len = 0;
    }
}
