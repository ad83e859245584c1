//! Resumption cache.
//!
//! When a TLS session is cached, the attributes its authentication produced
//! are cached next to it. On resumption they are looked up by session id and
//! restored (see [`crate::restore`]).

use std::{cell::RefCell, collections::HashMap};

use bytes::Bytes;

use crate::{attribute::AttributeList, error::TlsError};

/// Lookup of cached attributes by TLS session id.
pub trait ResumptionCache {
    /// Attributes stored for `session_id`, if any.
    fn lookup(&self, session_id: &[u8]) -> Option<AttributeList>;
}

/// A cache that never has anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResumptionCache for NoCache {
    fn lookup(&self, _session_id: &[u8]) -> Option<AttributeList> {
        None
    }
}

/// In-memory cache. Entries are stored CBOR-encoded, the same form an
/// external session store would hold them in.
#[derive(Debug, Default)]
pub struct MemoryResumptionCache {
    entries: RefCell<HashMap<Vec<u8>, Bytes>>,
}

impl MemoryResumptionCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `attrs` for `session_id`, replacing any previous entry.
    pub fn store(&self, session_id: &[u8], attrs: &AttributeList) -> Result<(), TlsError> {
        let blob = encode(attrs)?;
        self.entries.borrow_mut().insert(session_id.to_vec(), blob);
        Ok(())
    }

    /// Drop the entry for `session_id`.
    pub fn remove(&self, session_id: &[u8]) -> bool {
        self.entries.borrow_mut().remove(session_id).is_some()
    }

    /// Number of cached sessions.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ResumptionCache for MemoryResumptionCache {
    fn lookup(&self, session_id: &[u8]) -> Option<AttributeList> {
        let entries = self.entries.borrow();
        let blob = entries.get(session_id)?;
        match decode(blob) {
            Ok(attrs) => Some(attrs),
            Err(err) => {
                tracing::warn!(%err, "discarding unreadable cached session");
                None
            },
        }
    }
}

/// CBOR-encode an attribute list.
pub fn encode(attrs: &AttributeList) -> Result<Bytes, TlsError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(attrs, &mut buf).map_err(|e| TlsError::CacheCodec(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode a CBOR attribute list.
pub fn decode(blob: &[u8]) -> Result<AttributeList, TlsError> {
    ciborium::de::from_reader(blob).map_err(|e| TlsError::CacheCodec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttrValue, Attribute};

    #[test]
    fn stored_attributes_come_back() {
        let cache = MemoryResumptionCache::new();
        let attrs = vec![
            Attribute::text(1, "alice"),
            Attribute::integer(27, 3600),
            Attribute::new(79, AttrValue::Octets(Bytes::from_static(&[1, 2, 3]))),
        ];

        cache.store(b"session-1", &attrs).unwrap();
        assert_eq!(cache.lookup(b"session-1"), Some(attrs));
        assert_eq!(cache.lookup(b"session-2"), None);
    }

    #[test]
    fn remove_forgets_entry() {
        let cache = MemoryResumptionCache::new();
        cache.store(b"s", &vec![Attribute::integer(1, 1)]).unwrap();
        assert!(cache.remove(b"s"));
        assert!(cache.is_empty());
        assert!(!cache.remove(b"s"));
    }

    #[test]
    fn garbage_blob_fails_to_decode() {
        assert!(matches!(decode(&[0xff, 0x00]), Err(TlsError::CacheCodec(_))));
    }
}
