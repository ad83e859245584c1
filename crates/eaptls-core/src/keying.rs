//! Key material for the NAS (RFC 5216 section 2.3, RFC 9190 section 2.3).
//!
//! The exporter output is split into MSK and EMSK. The MSK halves become the
//! MS-MPPE receive and send keys handed to the NAS. The supplicant derives
//! the same values on its side.

use tracing::debug;

use crate::{
    engine::{HandshakeEngine, TlsVersion},
    error::TlsError,
};

/// Exporter label for TLS 1.3 key material
pub const TLS13_KEY_LABEL: &str = "EXPORTER_EAP_TLS_Key_Material";

/// Exporter label for the TLS 1.3 Session-Id
pub const TLS13_SESSION_ID_LABEL: &str = "EXPORTER_EAP_TLS_Session-Id";

/// MSK / EMSK length
pub const MSK_LEN: usize = 64;

/// Length of one MPPE key
pub const MPPE_KEY_LEN: usize = 32;

/// Keys derived at the end of a successful handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    /// Master Session Key
    pub msk: [u8; MSK_LEN],
    /// Extended Master Session Key
    pub emsk: [u8; MSK_LEN],
    /// EAP Session-Id (method type followed by 64 bytes)
    pub session_id: Vec<u8>,
}

impl SessionKeys {
    /// MS-MPPE-Recv-Key
    pub fn mppe_recv_key(&self) -> &[u8] {
        &self.msk[..MPPE_KEY_LEN]
    }

    /// MS-MPPE-Send-Key
    pub fn mppe_send_key(&self) -> &[u8] {
        &self.msk[MPPE_KEY_LEN..]
    }
}

// Keys never go to logs
impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").field("session_id_len", &self.session_id.len()).finish_non_exhaustive()
    }
}

/// Derive MSK, EMSK and Session-Id from a finished handshake.
///
/// TLS 1.3 always uses the RFC 9190 label with the method type as context.
/// Older versions use `prf_label` with no context.
pub fn derive<E: HandshakeEngine>(engine: &E, prf_label: Option<&str>, eap_type: u8) -> Result<SessionKeys, TlsError> {
    let version = engine.negotiated_version();
    let context = [eap_type];
    let (label, context) = match version {
        Some(TlsVersion::Tls13) => (TLS13_KEY_LABEL, Some(&context[..])),
        Some(TlsVersion::Tls10 | TlsVersion::Tls11 | TlsVersion::Tls12) => {
            (prf_label.ok_or(TlsError::MissingPrfLabel)?, None)
        },
        Some(TlsVersion::Ssl3) | None => return Err(TlsError::UnsupportedVersion(version)),
    };

    let mut out = [0u8; 2 * MSK_LEN];
    engine.export_key(label, context, &mut out)?;

    let mut msk = [0u8; MSK_LEN];
    let mut emsk = [0u8; MSK_LEN];
    msk.copy_from_slice(&out[..MSK_LEN]);
    emsk.copy_from_slice(&out[MSK_LEN..]);

    let session_id = derive_session_id(engine, version, eap_type)?;
    debug!(?version, label, "derived MPPE keying material");

    Ok(SessionKeys { msk, emsk, session_id })
}

fn derive_session_id<E: HandshakeEngine>(
    engine: &E,
    version: Option<TlsVersion>,
    eap_type: u8,
) -> Result<Vec<u8>, TlsError> {
    let mut id = Vec::with_capacity(1 + MSK_LEN);
    id.push(eap_type);

    if version == Some(TlsVersion::Tls13) {
        let mut tail = [0u8; MSK_LEN];
        engine.export_key(TLS13_SESSION_ID_LABEL, None, &mut tail)?;
        id.extend_from_slice(&tail);
    } else if let Some((client_random, server_random)) = engine.hello_randoms() {
        id.extend_from_slice(&client_random);
        id.extend_from_slice(&server_random);
    }

    Ok(id)
}
