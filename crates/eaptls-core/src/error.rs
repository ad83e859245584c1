//! Error types for the EAP-TLS core.

use eaptls_proto::ProtocolError;
use thiserror::Error;

use crate::engine::{EngineError, TlsVersion};

/// Errors that end the current round.
///
/// The session layer never returns these to the peer directly. They are
/// logged and collapse into [`eaptls_proto::TlsStatus::Fail`], after which
/// the caller sends an EAP-Failure.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Malformed packet
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The handshake engine rejected input or could not export keys
    #[error("handshake engine: {0}")]
    Engine(#[from] EngineError),

    /// The reassembly buffer could not hold the fragment
    #[error("exceeded maximum record size: {len} more bytes with {remaining} bytes of room")]
    RecordOverflow {
        /// Bytes that were offered
        len: usize,
        /// Room left in the buffer
        remaining: usize,
    },

    /// Engine has nothing to send but the handshake is not finished
    #[error("TLS failed during operation: no data to send and handshake incomplete")]
    HandshakeIncomplete,

    /// Negotiated version has no keying material definition
    #[error("cannot derive keys for {0:?}")]
    UnsupportedVersion(Option<TlsVersion>),

    /// Keys requested but no PRF label is configured
    #[error("no PRF label configured for keying material")]
    MissingPrfLabel,

    /// Resumption cache entry could not be encoded or decoded
    #[error("resumption cache codec: {0}")]
    CacheCodec(String),
}

/// Configuration rejected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Effective fragment size outside the allowed window
    #[error(
        "configured fragment size {configured} leaves {effective} bytes per fragment, must be between {min} and {max}"
    )]
    FragmentSizeOutOfRange {
        /// Value from the configuration
        configured: usize,
        /// Value after subtracting header overhead
        effective: usize,
        /// Lowest accepted effective size
        min: usize,
        /// Highest accepted effective size
        max: usize,
    },

    /// Maximum record size cannot hold a single fragment
    #[error("max_record_size {max_record_size} is smaller than one fragment ({fragment} bytes)")]
    RecordSizeTooSmall {
        /// Value from the configuration
        max_record_size: u32,
        /// Effective fragment size
        fragment: usize,
    },
}
