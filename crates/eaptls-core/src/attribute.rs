//! Attributes carried alongside an authentication attempt.
//!
//! Only the identifiers this layer routes on are named here. Everything
//! else passes through opaquely.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Attribute identifier (vendor 0 namespace unless `vendor` is set)
pub type AttrId = u32;

/// First certificate attribute (TLS-Cert-Serial)
pub const TLS_CERT_FIRST: AttrId = 1910;

/// Last certificate attribute (TLS-Client-Cert-Subject-Alt-Name-UPN)
pub const TLS_CERT_LAST: AttrId = 1925;

/// Negotiated EAP method (EAP-Type)
pub const EAP_TYPE: AttrId = 1018;

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Raw bytes
    Octets(Bytes),
    /// UTF-8 text
    Text(String),
    /// 32-bit integer
    Integer(u32),
}

/// One attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Vendor, 0 for the base dictionary
    pub vendor: u32,
    /// Identifier within the vendor's space
    pub id: AttrId,
    /// Value
    pub value: AttrValue,
}

impl Attribute {
    /// Base-dictionary attribute.
    pub fn new(id: AttrId, value: AttrValue) -> Self {
        Self { vendor: 0, id, value }
    }

    /// Base-dictionary text attribute.
    pub fn text(id: AttrId, value: impl Into<String>) -> Self {
        Self::new(id, AttrValue::Text(value.into()))
    }

    /// Base-dictionary integer attribute.
    pub fn integer(id: AttrId, value: u32) -> Self {
        Self::new(id, AttrValue::Integer(value))
    }

    /// Whether this is one of the TLS certificate attributes.
    pub fn is_certificate(&self) -> bool {
        self.vendor == 0 && (TLS_CERT_FIRST..=TLS_CERT_LAST).contains(&self.id)
    }

    /// Whether this is the EAP-Type pseudo-attribute.
    pub fn is_eap_type(&self) -> bool {
        self.vendor == 0 && self.id == EAP_TYPE
    }
}

/// Ordered attribute list.
pub type AttributeList = Vec<Attribute>;

/// Append `attr` unless an equal attribute is already present.
///
/// Returns whether it was added.
pub fn merge_one(list: &mut AttributeList, attr: &Attribute) -> bool {
    if list.contains(attr) {
        return false;
    }
    list.push(attr.clone());
    true
}
