//! Deterministic simulation harness for EAP-TLS testing.
//!
//! A scripted engine and a simulated supplicant drive a real
//! [`eaptls_core::Session`] through complete conversations. All randomness
//! comes from one seed, so every run is reproducible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod peer;
pub mod scenario;
pub mod sim;

use eaptls_core::{ConfigError, TlsError};
use thiserror::Error;

pub use engine::{EngineScript, ScriptedEngine};
pub use peer::{Peer, PeerScript};
pub use sim::Simulation;

/// Reasons a simulated conversation could not run to completion.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Server configuration was rejected
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Session returned an error outside a round
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Session reported Handled without a reply
    #[error("round handled but no reply was produced")]
    MissingReply,

    /// Peer received something a supplicant cannot answer
    #[error("peer protocol violation: {0}")]
    Peer(String),

    /// Conversation did not end
    #[error("no result after {0} rounds")]
    RoundLimit(usize),
}
