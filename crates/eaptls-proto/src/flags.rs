//! EAP-TLS flag byte.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flag byte that leads every EAP-TLS type-data field.
    ///
    /// Only L, M and S carry meaning for fragmentation. The low five bits
    /// belong to the tunnelled method (PEAP and friends put their version
    /// there) and are copied into replies untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TlsFlags: u8 {
        /// Four octet TLS Message Length follows the flag byte
        const LENGTH_INCLUDED = 0x80;
        /// More fragments of this TLS message follow
        const MORE_FRAGMENTS = 0x40;
        /// EAP-TLS Start, only ever sent by the server
        const START = 0x20;

        // Passthrough bits are not flags, but they must survive a round trip
        const _ = 0x1f;
    }
}

impl TlsFlags {
    /// Bits that are neither L, M nor S
    pub const PASSTHROUGH_MASK: u8 = 0x1f;

    /// Build flags from a raw byte, keeping every bit.
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Passthrough bits only.
    pub fn passthrough(self) -> Self {
        Self::from_bits_retain(self.bits() & Self::PASSTHROUGH_MASK)
    }

    /// Whether the L bit is set.
    pub fn length_included(self) -> bool {
        self.contains(Self::LENGTH_INCLUDED)
    }

    /// Whether the M bit is set.
    pub fn more_fragments(self) -> bool {
        self.contains(Self::MORE_FRAGMENTS)
    }

    /// Whether the S bit is set.
    pub fn start(self) -> bool {
        self.contains(Self::START)
    }

    /// Three character `SML` rendering used in trace output.
    pub fn describe(self) -> String {
        let mut out = String::with_capacity(3);
        out.push(if self.start() { 'S' } else { '-' });
        out.push(if self.more_fragments() { 'M' } else { '-' });
        out.push(if self.length_included() { 'L' } else { '-' });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_keeps_low_bits_only() {
        let flags = TlsFlags::from_byte(0xe3);
        assert!(flags.length_included());
        assert!(flags.more_fragments());
        assert!(flags.start());
        assert_eq!(flags.passthrough().bits(), 0x03);
    }

    #[test]
    fn unknown_bits_are_retained() {
        assert_eq!(TlsFlags::from_byte(0x85).bits(), 0x85);
    }

    #[test]
    fn describe_renders_set_bits() {
        assert_eq!(TlsFlags::from_byte(0xc0).describe(), "-ML");
        assert_eq!(TlsFlags::START.describe(), "S--");
        assert_eq!(TlsFlags::empty().describe(), "---");
    }
}
