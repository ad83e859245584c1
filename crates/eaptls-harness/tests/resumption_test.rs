//! Session resumption: cached attributes come back on the resumed
//! conversation.

use bytes::Bytes;
use eaptls_core::{
    MemoryResumptionCache, TlsVersion,
    attribute::{Attribute, EAP_TYPE, TLS_CERT_FIRST},
    config::TlsConfig,
};
use eaptls_harness::scenario::Scenario;

const USER_NAME: u32 = 1;
const CLASS: u32 = 25;

fn cache_with(session_id: &[u8]) -> MemoryResumptionCache {
    let cache = MemoryResumptionCache::new();
    cache
        .store(
            session_id,
            &vec![
                Attribute::text(USER_NAME, "alice"),
                Attribute::text(TLS_CERT_FIRST, "4f2a"),
                Attribute::integer(EAP_TYPE, 13),
                Attribute::text(CLASS, "gold"),
            ],
        )
        .unwrap();
    cache
}

fn flights() -> [Bytes; 2] {
    [Bytes::from_static(b"client hello with ticket"), Bytes::from_static(b"client finished")]
}

#[test]
fn resumed_tls12_session_restores_attributes() {
    let config =
        TlsConfig { session_state_attributes: [USER_NAME].into_iter().collect(), ..TlsConfig::default() };

    let result = Scenario::new("tls 1.2 resumption")
        .config(config)
        .resumed(b"resume-me", cache_with(b"resume-me"))
        .client_flights(flights())
        .server_flights([Bytes::from_static(b"server hello, ccs, finished")])
        .oracle(Box::new(|world| {
            if !world.succeeded() {
                return Err(format!("expected Success, got {:?}", world.final_code()));
            }
            let restored = world.restored().ok_or("attributes should be restored")?;
            if restored.session_state != [Attribute::text(USER_NAME, "alice")] {
                return Err(format!("session-state: {:?}", restored.session_state));
            }
            if restored.request != [Attribute::text(TLS_CERT_FIRST, "4f2a")] {
                return Err(format!("request: {:?}", restored.request));
            }
            if restored.control != [Attribute::integer(EAP_TYPE, 13)] {
                return Err(format!("control: {:?}", restored.control));
            }
            if restored.reply != [Attribute::text(CLASS, "gold")] {
                return Err(format!("reply: {:?}", restored.reply));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {:?}", result);
}

#[test]
fn resumed_tls13_session_signals_and_restores() {
    let result = Scenario::new("tls 1.3 resumption")
        .version(TlsVersion::Tls13)
        .resumed(b"psk-1", cache_with(b"psk-1"))
        .client_flights(flights())
        .server_flights([Bytes::from_static(b"server hello, finished")])
        .oracle(Box::new(|world| {
            if !world.succeeded() {
                return Err(format!("expected Success, got {:?}", world.final_code()));
            }
            let session = world.session().ok_or("session should exist")?;
            if session.engine().signals_sent().len() != 1 {
                return Err("resumed TLS 1.3 should signal completion".into());
            }
            let restored = world.restored().ok_or("attributes should be restored after the final ACK")?;
            if restored.len() != 4 {
                return Err(format!("expected 4 restored attributes, got {}", restored.len()));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {:?}", result);
}

#[test]
fn existing_certificate_attributes_are_not_restored() {
    let result = Scenario::new("resumption with certificate attributes present")
        .resumed(b"resume-me", cache_with(b"resume-me"))
        .certificate_attributes(vec![Attribute::text(TLS_CERT_FIRST, "live")])
        .client_flights(flights())
        .server_flights([Bytes::from_static(b"server flight")])
        .oracle(Box::new(|world| {
            let restored = world.restored().ok_or("attributes should be restored")?;
            if !restored.request.is_empty() {
                return Err("cached certificate attributes should be dropped".into());
            }
            if world.request_attributes() != &vec![Attribute::text(TLS_CERT_FIRST, "live")] {
                return Err(format!("request attributes: {:?}", world.request_attributes()));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {:?}", result);
}

#[test]
fn resumption_without_cache_entry_still_succeeds() {
    let result = Scenario::new("resumption with empty cache")
        .resumed(b"unknown", MemoryResumptionCache::new())
        .client_flights(flights())
        .server_flights([Bytes::from_static(b"server flight")])
        .oracle(Box::new(|world| {
            if !world.succeeded() {
                return Err("expected Success".into());
            }
            if world.restored().is_some() {
                return Err("nothing should be restored".into());
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {:?}", result);
}
