//! EAP packet codes.

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Outer EAP code (RFC 3748 section 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Code {
    /// Sent by the authenticator
    Request = 1,
    /// Sent by the peer
    Response = 2,
    /// Authentication succeeded
    Success = 3,
    /// Authentication failed
    Failure = 4,
}

impl Code {
    /// Convert from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Request),
            2 => Some(Self::Response),
            3 => Some(Self::Success),
            4 => Some(Self::Failure),
            _ => None,
        }
    }

    /// Convert to the wire value.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether packets with this code carry a method type octet.
    pub fn has_type(self) -> bool {
        matches!(self, Self::Request | Self::Response)
    }
}
