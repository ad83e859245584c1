//! Wire format for EAP-TLS fragment framing.
//!
//! An EAP-TLS exchange rides inside ordinary EAP Request/Response packets.
//! Each packet carries one flag byte, an optional four octet TLS Message
//! Length, and at most one fragment of TLS data:
//!
//! ```text
//! byte 0:      flags  (bit7=L, bit6=M, bit5=S, bits4..0=passthrough)
//! bytes 1..4:  total-length (uint32, present only if L set)
//! bytes 5..N  or 1..N:  fragment payload
//! ```
//!
//! This crate only knows how to read and write those bytes. Deciding what a
//! packet means for the conversation is the job of `eaptls-core`.
//!
//! # Security
//!
//! Fixed layouts are read through `zerocopy`, so no length is trusted before
//! it has been bounds checked. Declared record sizes above the configured
//! ceiling are rejected before any payload is sliced out.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codes;
pub mod envelope;
pub mod errors;
pub mod flags;
pub mod packet;
pub mod status;

pub use codes::Code;
pub use envelope::EapMessage;
pub use errors::{ProtocolError, Result};
pub use flags::TlsFlags;
pub use packet::{ComposedReply, ReplyKind, TlsPacket, TlsReply};
pub use status::TlsStatus;
