//! Handshake engine abstraction.
//!
//! The TLS library itself lives outside this crate. The session hands it
//! complete inbound messages and collects whatever it wants to send; it
//! never looks inside the records.
//!
//! NOTE: Every call is synchronous. Engines that need I/O of their own
//! (OCSP, CRL fetches) must resolve it before returning from `receive`.

use thiserror::Error;

/// Negotiated protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// SSL 3.0, never valid for EAP keying
    Ssl3,
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Newest version this layer knows how to finish.
    pub const NEWEST: Self = Self::Tls13;
}

/// How to tell a TLS 1.3 peer that the handshake is over when there is no
/// application data to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSignal {
    /// One byte of zero application data
    CommitmentMessage,
    /// A close_notify alert
    CloseNotify,
}

/// Errors reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Handshake processing failed (bad record, alert, verify failure)
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Flushing pending output failed
    #[error("send failed: {0}")]
    Send(String),

    /// Key exporter failed
    #[error("key export failed: {0}")]
    Export(String),
}

/// TLS handshake engine as seen by the EAP-TLS session.
///
/// Output produced by `receive` or `send` accumulates until the session
/// copies it out with [`HandshakeEngine::pending_outbound`] and
/// [`HandshakeEngine::clear_outbound`].
pub trait HandshakeEngine {
    /// Feed one complete inbound TLS message.
    fn receive(&mut self, data: &[u8]) -> Result<(), EngineError>;

    /// Flush any queued handshake or application output.
    fn send(&mut self) -> Result<(), EngineError>;

    /// Bytes waiting to go to the peer.
    fn pending_outbound(&self) -> &[u8];

    /// Forget the pending bytes once the session owns a copy.
    fn clear_outbound(&mut self);

    /// Whether the handshake has structurally finished.
    fn is_finished(&self) -> bool;

    /// Version, once negotiated.
    fn negotiated_version(&self) -> Option<TlsVersion>;

    /// Export keying material (RFC 5705 / RFC 8446 section 7.5).
    fn export_key(&self, label: &str, context: Option<&[u8]>, out: &mut [u8]) -> Result<(), EngineError>;

    /// Queue the end-of-handshake signal. Takes effect on the next `send`.
    fn signal_completion(&mut self, signal: CompletionSignal);

    /// Whether the peer presented a certificate that passed validation.
    fn client_cert_verified(&self) -> bool;

    /// Whether this handshake resumed a cached session.
    fn session_reused(&self) -> bool;

    /// Identifier of the (possibly resumed) TLS session.
    fn session_id(&self) -> Option<&[u8]>;

    /// Whether the last output was a fatal alert.
    fn alert_sent(&self) -> bool {
        false
    }

    /// Permit the engine to issue `count` session tickets.
    fn allow_session_tickets(&mut self, _count: usize) {}

    /// Client and server hello randoms, for the EAP Session-Id.
    fn hello_randoms(&self) -> Option<([u8; 32], [u8; 32])> {
        None
    }

    /// Mark the TLS session as failed so it is not cached.
    fn fail(&mut self) {}
}
