//! Per-listener EAP-TLS configuration.

use std::collections::HashSet;

use eaptls_proto::{EapMessage, TlsFlags};
use serde::Deserialize;

use crate::{attribute::AttrId, error::ConfigError};

/// EAP header (4) plus EAP-TLS header (type, flags, length: 6)
pub const FRAGMENT_OVERHEAD: usize = 10;

/// Smallest accepted fragment payload after overhead
pub const MIN_EFFECTIVE_FRAGMENT: usize = 110;

/// Largest accepted fragment payload after overhead.
///
/// A RADIUS packet is at most 4096 bytes; after its own header,
/// Message-Authenticator and State roughly 4000 bytes are left for EAP.
pub const MAX_EFFECTIVE_FRAGMENT: usize = 3990;

/// Default ceiling on a reassembled TLS message
pub const DEFAULT_MAX_RECORD_SIZE: u32 = 65536;

/// EAP-TLS listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Fragment size as configured, header overhead included
    pub fragment_size: usize,
    /// Largest TLS message the reassembly buffer accepts
    pub max_record_size: u32,
    /// Put the L bit and length field on every fragment, not just the first
    pub include_length: bool,
    /// Finish TLS 1.3 with one zero byte of application data instead of
    /// close_notify
    pub tls13_send_zero: bool,
    /// Allow a session ticket once authentication has been checked
    pub session_cache_enable: bool,
    /// Cached attributes restored into session-state on resumption
    pub session_state_attributes: HashSet<AttrId>,
    /// Keying-material label for TLS 1.2 and older
    pub prf_label: Option<String>,
    /// EAP method type
    pub eap_type: u8,
    /// Passthrough bits copied into every reply (PEAP version)
    pub peap_flag: u8,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            fragment_size: 1024,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            include_length: true,
            tls13_send_zero: false,
            session_cache_enable: false,
            session_state_attributes: HashSet::new(),
            prf_label: Some("client EAP encryption".to_string()),
            eap_type: EapMessage::TYPE_TLS,
            peap_flag: 0,
        }
    }
}

impl TlsConfig {
    /// Check ranges and return the effective fragment size.
    ///
    /// Called once at startup. A listener must not start if this fails.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        let effective = self.fragment_size.saturating_sub(FRAGMENT_OVERHEAD);
        if !(MIN_EFFECTIVE_FRAGMENT..=MAX_EFFECTIVE_FRAGMENT).contains(&effective) {
            return Err(ConfigError::FragmentSizeOutOfRange {
                configured: self.fragment_size,
                effective,
                min: MIN_EFFECTIVE_FRAGMENT,
                max: MAX_EFFECTIVE_FRAGMENT,
            });
        }

        if (self.max_record_size as usize) < effective {
            return Err(ConfigError::RecordSizeTooSmall {
                max_record_size: self.max_record_size,
                fragment: effective,
            });
        }

        Ok(effective)
    }

    /// Passthrough bits as flags.
    pub fn passthrough(&self) -> TlsFlags {
        TlsFlags::from_byte(self.peap_flag).passthrough()
    }
}
