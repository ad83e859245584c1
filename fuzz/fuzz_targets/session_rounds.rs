//! Feed a session a sequence of arbitrary responses.
//!
//! Input is split on a length byte into messages. The session must never
//! panic and never buffer more than the configured record size.

#![no_main]

use bytes::Bytes;
use eaptls_core::{NoCache, NoTunnel, RoundContext, Session, TlsConfig, attribute::AttributeList};
use eaptls_harness::{EngineScript, ScriptedEngine};
use eaptls_proto::{Code, EapMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = TlsConfig { fragment_size: 120, max_record_size: 4096, ..TlsConfig::default() };
    let script = EngineScript { server_flights: vec![Bytes::from(vec![0x16; 700])], ..EngineScript::default() };
    let Ok(mut session) = Session::new(ScriptedEngine::new(script), config) else {
        return;
    };

    let mut id = session.start(0).id;
    let mut request = AttributeList::new();
    let mut tunnel = NoTunnel;

    let mut rest = data;
    while let Some((&len, tail)) = rest.split_first() {
        let len = (len as usize).min(tail.len());
        let (type_data, next) = tail.split_at(len);
        rest = next;

        let msg = EapMessage::new(Code::Response, id, EapMessage::TYPE_TLS, type_data.to_vec());
        let mut ctx = RoundContext::new(&mut request, &NoCache, &mut tunnel);
        let outcome = session.process(&msg, &mut ctx);

        if let Some(reply) = outcome.reply {
            id = reply.id;
        }
        if session.state().is_finished() {
            break;
        }
    }

    for received in session.engine().received() {
        assert!(received.len() <= 4096);
    }
});
