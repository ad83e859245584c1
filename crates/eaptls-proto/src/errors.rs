//! Error types for wire parsing.

use thiserror::Error;

use crate::TlsStatus;

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding an EAP envelope or extracting TLS data.
///
/// Every variant is fatal for the round that produced it. None of them
/// leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer shorter than the fixed EAP header
    #[error("EAP packet too short: {actual} bytes, need at least {expected}")]
    EnvelopeTooShort {
        /// Minimum bytes required
        expected: usize,
        /// Bytes that were available
        actual: usize,
    },

    /// EAP length field disagrees with the buffer
    #[error("EAP length field says {declared} bytes but {actual} are available")]
    LengthMismatch {
        /// Length carried in the header
        declared: usize,
        /// Bytes that were available
        actual: usize,
    },

    /// EAP code outside Request/Response/Success/Failure
    #[error("unknown EAP code {0}")]
    UnknownCode(u8),

    /// No flag byte after the method type octet
    #[error("EAP-TLS packet too short: {actual} bytes of type data, need at least {expected}")]
    TooShort {
        /// Minimum bytes required
        expected: usize,
        /// Bytes that were available
        actual: usize,
    },

    /// L flag set but the four octet length does not fit
    #[error("length bit is set, but packet too short to contain length field")]
    LengthFieldMissing,

    /// Declared TLS message length exceeds the configured ceiling
    #[error("reassembled TLS record will be {size} bytes, greater than maximum record size ({max} bytes)")]
    RecordTooLarge {
        /// Declared size
        size: u32,
        /// Configured maximum
        max: u32,
    },

    /// Status does not describe a packet that carries data
    #[error("cannot extract TLS data from a packet classified as {0}")]
    NotExtractable(TlsStatus),
}
