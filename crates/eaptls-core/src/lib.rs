//! EAP-TLS core logic
//!
//! Fragmentation, reassembly and handshake sequencing for EAP-TLS
//! (RFC 5216, RFC 9190), decoupled from I/O and from any particular TLS
//! library.
//!
//! # Architecture
//!
//! A [`Session`] is a synchronous state machine advanced one EAP round at a
//! time. The TLS library sits behind [`HandshakeEngine`]; the resumption
//! cache and post-handshake tunnel are lent to each round through
//! [`RoundContext`]. Nothing here blocks, sleeps or spawns.
//!
//! # Components
//!
//! - [`classify`]: Inbound fragment classification
//! - [`record`]: Reassembly and outbound byte stores
//! - [`fragment`]: Outbound fragmentation
//! - [`driver`]: Operation driver
//! - [`session`]: Per-round orchestration
//! - [`restore`]: Cached attribute restoration on resumption
//! - [`keying`]: MSK, EMSK and Session-Id derivation
//! - [`config`]: Listener configuration
//! - [`error`]: Error types

pub mod attribute;
pub mod classify;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod keying;
pub mod record;
pub mod restore;
pub mod resumption;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use config::TlsConfig;
pub use driver::{DriverState, Outcome};
pub use engine::{CompletionSignal, EngineError, HandshakeEngine, TlsVersion};
pub use error::{ConfigError, TlsError};
pub use keying::SessionKeys;
pub use restore::RestoredAttributes;
pub use resumption::{MemoryResumptionCache, NoCache, ResumptionCache};
pub use session::{NoTunnel, RoundContext, RoundOutcome, Session, SuccessOutcome, TunnelHandler};
