//! Attribute restoration on session resumption.
//!
//! A resumed TLS session skips certificate validation, so whatever the
//! original authentication produced has to come back from the cache. Each
//! cached attribute goes to exactly one destination list, or is dropped.

use std::collections::HashSet;

use tracing::debug;

use crate::attribute::{AttrId, Attribute, AttributeList};

/// Destination lists for restored attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredAttributes {
    /// Persisted across rounds of this authentication
    pub session_state: AttributeList,
    /// Treated as if the peer had sent them
    pub request: AttributeList,
    /// Server-side control items (EAP-Type, for sanity checks)
    pub control: AttributeList,
    /// Returned to the NAS
    pub reply: AttributeList,
}

impl RestoredAttributes {
    /// Whether nothing was restored.
    pub fn is_empty(&self) -> bool {
        self.session_state.is_empty() && self.request.is_empty() && self.control.is_empty() && self.reply.is_empty()
    }

    /// Total attributes across all buckets.
    pub fn len(&self) -> usize {
        self.session_state.len() + self.request.len() + self.control.len() + self.reply.len()
    }
}

/// Sort `cached` into `into`.
///
/// Rules, first match wins:
/// 1. id in `session_state_ids` goes to session-state
/// 2. certificate attribute goes to request, unless certificate attributes
///    were already merged this round, in which case it is dropped
/// 3. EAP-Type goes to control
/// 4. everything else goes to reply
///
/// `cached` is only read. Every cached attribute is copied, repeats
/// included. An attribute the bucket already held before this call is
/// skipped, so dispatching the same list again changes nothing.
pub fn dispatch(
    cached: &[Attribute],
    session_state_ids: &HashSet<AttrId>,
    certs_present: bool,
    into: &mut RestoredAttributes,
) {
    let mut session_state = Bucket::new(&mut into.session_state);
    let mut request = Bucket::new(&mut into.request);
    let mut control = Bucket::new(&mut into.control);
    let mut reply = Bucket::new(&mut into.reply);

    for attr in cached {
        if attr.vendor == 0 && session_state_ids.contains(&attr.id) {
            debug!(id = attr.id, "&session-state:");
            session_state.push(attr);
            continue;
        }

        if attr.is_certificate() {
            if !certs_present {
                debug!(id = attr.id, "&request:");
                request.push(attr);
            }
        } else if attr.is_eap_type() {
            debug!(id = attr.id, "&control:");
            control.push(attr);
        } else {
            debug!(id = attr.id, "&reply:");
            reply.push(attr);
        }
    }
}

/// Destination list plus how much of it predates the current dispatch.
struct Bucket<'a> {
    list: &'a mut AttributeList,
    existing: usize,
}

impl<'a> Bucket<'a> {
    fn new(list: &'a mut AttributeList) -> Self {
        let existing = list.len();
        Self { list, existing }
    }

    fn push(&mut self, attr: &Attribute) {
        if !self.list[..self.existing].contains(attr) {
            self.list.push(attr.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{EAP_TYPE, TLS_CERT_FIRST};

    const USER_NAME: AttrId = 1;
    const CLASS: AttrId = 25;
    const SESSION_TIMEOUT: AttrId = 27;

    fn cached() -> Vec<Attribute> {
        vec![
            Attribute::text(USER_NAME, "alice"),
            Attribute::text(TLS_CERT_FIRST, "0a1b"),
            Attribute::integer(EAP_TYPE, 13),
            Attribute::text(CLASS, "gold"),
            Attribute::integer(SESSION_TIMEOUT, 3600),
        ]
    }

    #[test]
    fn attributes_land_in_their_buckets() {
        let allow: HashSet<_> = [USER_NAME].into_iter().collect();
        let mut out = RestoredAttributes::default();
        dispatch(&cached(), &allow, false, &mut out);

        assert_eq!(out.session_state, vec![Attribute::text(USER_NAME, "alice")]);
        assert_eq!(out.request, vec![Attribute::text(TLS_CERT_FIRST, "0a1b")]);
        assert_eq!(out.control, vec![Attribute::integer(EAP_TYPE, 13)]);
        assert_eq!(out.reply, vec![Attribute::text(CLASS, "gold"), Attribute::integer(SESSION_TIMEOUT, 3600)]);
    }

    #[test]
    fn certificate_attributes_dropped_when_certs_present() {
        let mut out = RestoredAttributes::default();
        dispatch(&cached(), &HashSet::new(), true, &mut out);

        assert!(out.request.is_empty());
        assert!(!out.reply.iter().any(Attribute::is_certificate));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn session_state_rule_takes_precedence() {
        let allow: HashSet<_> = [EAP_TYPE, TLS_CERT_FIRST].into_iter().collect();
        let mut out = RestoredAttributes::default();
        dispatch(&cached(), &allow, false, &mut out);

        assert_eq!(out.session_state.len(), 2);
        assert!(out.control.is_empty());
        assert!(out.request.is_empty());
    }

    #[test]
    fn repeated_attributes_are_all_copied() {
        let list = vec![
            Attribute::text(CLASS, "gold"),
            Attribute::text(CLASS, "gold"),
            Attribute::text(CLASS, "silver"),
        ];
        let mut out = RestoredAttributes::default();
        dispatch(&list, &HashSet::new(), false, &mut out);
        assert_eq!(out.reply, list);
    }

    #[test]
    fn dispatch_twice_equals_once() {
        let allow: HashSet<_> = [USER_NAME].into_iter().collect();
        let mut list = cached();
        list.push(Attribute::text(CLASS, "gold"));

        let mut once = RestoredAttributes::default();
        dispatch(&list, &allow, false, &mut once);
        assert_eq!(once.reply.len(), 3);

        let mut fresh = RestoredAttributes::default();
        dispatch(&list, &allow, false, &mut fresh);
        assert_eq!(once, fresh);

        let mut twice = RestoredAttributes::default();
        dispatch(&list, &allow, false, &mut twice);
        dispatch(&list, &allow, false, &mut twice);
        assert_eq!(once, twice);

        let mut expected = cached();
        expected.push(Attribute::text(CLASS, "gold"));
        assert_eq!(list, expected);
    }

    #[test]
    fn attributes_already_in_a_bucket_are_kept_once() {
        let mut out = RestoredAttributes { reply: vec![Attribute::text(CLASS, "gold")], ..Default::default() };
        let list = [Attribute::text(CLASS, "gold"), Attribute::text(CLASS, "silver")];
        dispatch(&list, &HashSet::new(), false, &mut out);
        assert_eq!(out.reply, vec![Attribute::text(CLASS, "gold"), Attribute::text(CLASS, "silver")]);
    }

    #[test]
    fn order_is_preserved() {
        let list: Vec<_> = (100..110).map(|id| Attribute::integer(id, id)).collect();
        let mut out = RestoredAttributes::default();
        dispatch(&list, &HashSet::new(), false, &mut out);
        assert_eq!(out.reply, list);
    }
}
