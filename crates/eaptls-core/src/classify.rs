//! Inbound fragment classification.
//!
//! The peer announces the total length of a burst only on its first
//! fragment. Every later fragment is interpreted from two pieces of sticky
//! state: the M bit of the previous response, and the running counters
//! kept here. Fragments may arrive at irregular sizes.
//!
//! Counter inconsistencies are logged and otherwise ignored. Once a packet
//! is minimally well formed its framing is trusted.

use eaptls_proto::{EapMessage, TlsFlags, TlsStatus, packet};
use tracing::{debug, error, trace, warn};

/// Reassembly counters for the burst being received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Total announced on the first fragment of the burst
    pub declared_total: Option<u32>,
    /// Fragment bytes seen so far in the burst
    pub received: usize,
}

impl Counters {
    fn begin(&mut self, total_len: u32, frag_len: usize) {
        self.declared_total = Some(total_len);
        self.received = frag_len;
    }

    fn add(&mut self, frag_len: usize) {
        self.received = self.received.saturating_add(frag_len);
    }

    fn exceeds_declared(&self) -> bool {
        self.declared_total.is_some_and(|total| self.received > total as usize)
    }

    fn matches_declared(&self) -> bool {
        self.declared_total.is_some_and(|total| self.received == total as usize)
    }
}

/// What the previous round left behind.
///
/// Only the two facts classification needs are kept: the identifier of the
/// last request we sent, and the flags of the last response we received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviousRound {
    /// Identifier of the last Request sent to the peer
    pub request_id: Option<u8>,
    /// Flags of the last Response received from the peer
    pub response_flags: Option<TlsFlags>,
}

impl PreviousRound {
    fn more_fragments(&self) -> bool {
        matches!(self.response_flags, Some(flags) if flags.more_fragments())
    }
}

/// Classify one response and update `counters`.
pub fn classify(msg: &EapMessage, prev: &PreviousRound, counters: &mut Counters) -> TlsStatus {
    let type_data = &msg.type_data;
    let Some(&flag_byte) = type_data.first() else {
        return classify_ack(msg, prev);
    };
    let flags = TlsFlags::from_byte(flag_byte);
    trace!(id = msg.id, flags = %flags.describe(), "peer sent flags");

    // Flags-only with nothing set: a fragment ACK
    if type_data.len() == packet::FLAGS_LEN
        && !flags.intersects(TlsFlags::LENGTH_INCLUDED | TlsFlags::MORE_FRAGMENTS | TlsFlags::START)
    {
        return classify_ack(msg, prev);
    }

    if flags.start() {
        error!(id = msg.id, "peer sent EAP-TLS Start message (only the server is allowed to do this)");
        return TlsStatus::Invalid;
    }

    if flags.length_included() {
        let total_len = match packet::declared_length(type_data) {
            Ok(Some(total_len)) => total_len,
            Ok(None) | Err(_) => {
                error!(id = msg.id, "length bit is set, but packet too short to contain length field");
                return TlsStatus::Fail;
            },
        };
        let frag_len = type_data.len() - packet::LENGTH_PREFIX_LEN;
        classify_with_length(msg.id, flags, total_len, frag_len, prev, counters)
    } else {
        let frag_len = type_data.len() - packet::FLAGS_LEN;
        classify_without_length(flags, frag_len, prev, counters)
    }
}

fn classify_ack(msg: &EapMessage, prev: &PreviousRound) -> TlsStatus {
    if prev.request_id == Some(msg.id) {
        debug!(id = msg.id, "peer acknowledged TLS record fragment");
        TlsStatus::Ack
    } else {
        error!(id = msg.id, expected = ?prev.request_id, "received invalid TLS ACK");
        TlsStatus::Invalid
    }
}

fn classify_with_length(
    id: u8,
    flags: TlsFlags,
    total_len: u32,
    frag_len: usize,
    prev: &PreviousRound,
    counters: &mut Counters,
) -> TlsStatus {
    if frag_len > total_len as usize {
        warn!(frag_len, total_len, "TLS fragment length greater than TLS record length");
    }
    debug!(id, total_len, "peer indicated complete TLS record size");

    if flags.more_fragments() {
        if !prev.more_fragments() {
            // Later fragments are usually four bytes larger: no length field
            debug!(
                frag_len,
                expected = (total_len as usize).saturating_sub(frag_len).div_ceil(frag_len + packet::LENGTH_FIELD_LEN) + 1,
                "got first TLS record fragment, more to follow"
            );

            counters.begin(total_len, frag_len);
            return TlsStatus::FirstFragment { declared_total: total_len };
        }

        counters.add(frag_len);
        debug!(frag_len, received = counters.received, "got additional TLS record fragment with length");
        if counters.exceeds_declared() {
            warn!(
                received = counters.received,
                declared = ?counters.declared_total,
                "total received TLS record fragments exceeds total TLS record length"
            );
        }
        return TlsStatus::MoreFragmentsWithLength;
    }

    if total_len as usize != frag_len {
        warn!(
            total_len,
            frag_len, "peer indicated no more fragments, but TLS record length does not match EAP-TLS data length"
        );
    }
    counters.begin(total_len, frag_len);
    debug!(frag_len, "got complete TLS record");
    TlsStatus::LengthIncludedComplete { declared_total: total_len }
}

fn classify_without_length(
    flags: TlsFlags,
    frag_len: usize,
    prev: &PreviousRound,
    counters: &mut Counters,
) -> TlsStatus {
    if prev.more_fragments() && !flags.more_fragments() {
        counters.add(frag_len);
        debug!(frag_len, received = counters.received, "got final TLS record fragment");
        if !counters.matches_declared() {
            warn!(
                received = counters.received,
                declared = ?counters.declared_total,
                "total received TLS record fragments does not equal indicated TLS record length"
            );
        }
    }

    if flags.more_fragments() {
        counters.add(frag_len);
        debug!(frag_len, received = counters.received, "got additional TLS record fragment, more to follow");
        if counters.exceeds_declared() {
            warn!(
                received = counters.received,
                declared = ?counters.declared_total,
                "total received TLS record fragments exceeds indicated TLS record length"
            );
        }
        return TlsStatus::MoreFragments;
    }

    TlsStatus::Ok
}
