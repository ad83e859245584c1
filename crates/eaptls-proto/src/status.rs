//! Classification status of a round.

use std::fmt;

/// Outcome of classifying or processing one EAP-TLS round.
///
/// The first group describes what an inbound packet is. `Handled`,
/// `NeedsRequest`, `Success` and `Fail` describe what processing decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsStatus {
    /// Bare fragment acknowledgement from the peer
    Ack,
    /// Rejected without touching session state
    Invalid,
    /// First fragment of a burst, L and M set
    FirstFragment {
        /// Total burst length announced by the peer
        declared_total: u32,
    },
    /// Continuation fragment without a length field
    MoreFragments,
    /// Continuation fragment that repeats the length field
    MoreFragmentsWithLength,
    /// Complete, unfragmented message with a length field
    LengthIncludedComplete {
        /// Message length announced by the peer
        declared_total: u32,
    },
    /// Complete message without a length field
    Ok,
    /// A reply has been produced, the conversation continues
    Handled,
    /// The peer acknowledged a fragment and wants the next one
    NeedsRequest,
    /// The handshake completed
    Success,
    /// The conversation failed
    Fail,
}

impl TlsStatus {
    /// Whether the peer still has fragments to send.
    pub fn fragment_pending(self) -> bool {
        matches!(self, Self::FirstFragment { .. } | Self::MoreFragments | Self::MoreFragmentsWithLength)
    }

    /// Whether the packet carries an explicit TLS Message Length.
    pub fn carries_length(self) -> bool {
        matches!(
            self,
            Self::FirstFragment { .. } | Self::MoreFragmentsWithLength | Self::LengthIncludedComplete { .. }
        )
    }

    /// Whether this status ends the round in error.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Invalid | Self::Fail)
    }
}

impl fmt::Display for TlsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ack => "ack",
            Self::Invalid => "invalid",
            Self::FirstFragment { .. } => "first fragment",
            Self::MoreFragments => "more fragments",
            Self::MoreFragmentsWithLength => "more fragments with length",
            Self::LengthIncludedComplete { .. } => "length included",
            Self::Ok => "ok",
            Self::Handled => "handled",
            Self::NeedsRequest => "request",
            Self::Success => "success",
            Self::Fail => "fail",
        };
        f.write_str(name)
    }
}
