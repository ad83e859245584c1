//! Decode arbitrary bytes as an EAP message and extract its TLS data.
//!
//! Neither step may panic, and extracted data is always shorter than the
//! type data it came from.

#![no_main]

use eaptls_core::classify::{Counters, PreviousRound, classify};
use eaptls_proto::{EapMessage, TlsPacket};
use libfuzzer_sys::fuzz_target;

const MAX_RECORD: u32 = 16384;

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = EapMessage::decode(data) else {
        return;
    };

    let mut counters = Counters::default();
    let status = classify(&msg, &PreviousRound::default(), &mut counters);

    if let Ok(packet) = TlsPacket::extract(&msg, status, MAX_RECORD) {
        assert!(packet.data.len() < msg.type_data.len());
    }
});
