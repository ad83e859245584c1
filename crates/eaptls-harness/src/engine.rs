//! Scripted handshake engine.
//!
//! Stands in for a TLS library. Each complete inbound message advances the
//! script by one step and queues the next server flight. Nothing is
//! encrypted; the flights are opaque byte strings chosen by the test.

use bytes::Bytes;
use eaptls_core::{CompletionSignal, EngineError, HandshakeEngine, TlsVersion};
use tracing::{debug, trace};

/// TLS 1.3 application data record holding one zero byte
pub const COMMITMENT_RECORD: [u8; 6] = [0x17, 0x03, 0x03, 0x00, 0x01, 0x00];

/// close_notify alert record
pub const CLOSE_NOTIFY_RECORD: [u8; 7] = [0x15, 0x03, 0x03, 0x00, 0x02, 0x01, 0x00];

/// Fatal handshake_failure alert record
pub const FATAL_ALERT_RECORD: [u8; 7] = [0x15, 0x03, 0x03, 0x00, 0x02, 0x02, 0x28];

/// What the simulated server does.
#[derive(Debug, Clone)]
pub struct EngineScript {
    /// Version reported once the first message has been received
    pub version: TlsVersion,
    /// Flight queued after each complete client message, in order
    pub server_flights: Vec<Bytes>,
    /// Client messages needed before the handshake is finished
    pub finish_after: usize,
    /// Whether the client certificate validates
    pub client_cert_ok: bool,
    /// Whether the client resumed a cached session
    pub resumed: bool,
    /// TLS session identifier
    pub session_id: Vec<u8>,
    /// Client message index the engine rejects outright
    pub reject_message: Option<usize>,
    /// Client message index answered with a fatal alert
    pub alert_message: Option<usize>,
    /// Secret the exporter is keyed with
    pub secret: u64,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            version: TlsVersion::Tls12,
            server_flights: Vec::new(),
            finish_after: 2,
            client_cert_ok: true,
            resumed: false,
            session_id: b"sim-session".to_vec(),
            reject_message: None,
            alert_message: None,
            secret: 0x5eed,
        }
    }
}

/// Handshake engine driven by an [`EngineScript`].
#[derive(Debug)]
pub struct ScriptedEngine {
    script: EngineScript,
    received: Vec<Bytes>,
    pending: Vec<u8>,
    signal: Option<CompletionSignal>,
    signals_sent: Vec<CompletionSignal>,
    tickets: usize,
    alert: bool,
    failed: bool,
}

impl ScriptedEngine {
    /// Engine at the start of `script`.
    pub fn new(script: EngineScript) -> Self {
        Self {
            script,
            received: Vec::new(),
            pending: Vec::new(),
            signal: None,
            signals_sent: Vec::new(),
            tickets: 0,
            alert: false,
            failed: false,
        }
    }

    /// Complete client messages received so far.
    pub fn received(&self) -> &[Bytes] {
        &self.received
    }

    /// Completion signals that were flushed.
    pub fn signals_sent(&self) -> &[CompletionSignal] {
        &self.signals_sent
    }

    /// Session tickets the engine was allowed to issue.
    pub fn tickets_allowed(&self) -> usize {
        self.tickets
    }

    /// Whether the session was marked failed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

impl HandshakeEngine for ScriptedEngine {
    fn receive(&mut self, data: &[u8]) -> Result<(), EngineError> {
        let index = self.received.len();
        if self.script.reject_message == Some(index) {
            return Err(EngineError::Handshake(format!("message {index} rejected")));
        }

        trace!(index, len = data.len(), "engine received client message");
        self.received.push(Bytes::copy_from_slice(data));

        if self.script.alert_message == Some(index) {
            self.alert = true;
            self.pending.extend_from_slice(&FATAL_ALERT_RECORD);
            return Ok(());
        }

        if let Some(flight) = self.script.server_flights.get(index) {
            self.pending.extend_from_slice(flight);
        }
        Ok(())
    }

    fn send(&mut self) -> Result<(), EngineError> {
        if let Some(signal) = self.signal.take() {
            debug!(?signal, "engine flushing completion signal");
            let record: &[u8] = match signal {
                CompletionSignal::CommitmentMessage => &COMMITMENT_RECORD,
                CompletionSignal::CloseNotify => &CLOSE_NOTIFY_RECORD,
            };
            self.pending.extend_from_slice(record);
            self.signals_sent.push(signal);
        }
        Ok(())
    }

    fn pending_outbound(&self) -> &[u8] {
        &self.pending
    }

    fn clear_outbound(&mut self) {
        self.pending.clear();
    }

    fn is_finished(&self) -> bool {
        !self.alert && self.received.len() >= self.script.finish_after
    }

    fn negotiated_version(&self) -> Option<TlsVersion> {
        (!self.received.is_empty()).then_some(self.script.version)
    }

    fn export_key(&self, label: &str, context: Option<&[u8]>, out: &mut [u8]) -> Result<(), EngineError> {
        if !self.is_finished() {
            return Err(EngineError::Export("handshake not finished".into()));
        }

        // FNV-1a over secret, label and context seeds an xorshift stream
        let mut state = 0xcbf2_9ce4_8422_2325_u64;
        let context = context.unwrap_or_default();
        for byte in self.script.secret.to_be_bytes().iter().chain(label.as_bytes()).chain(context) {
            state = (state ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3);
        }
        for byte in out.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *byte = (state >> 56) as u8;
        }
        Ok(())
    }

    fn signal_completion(&mut self, signal: CompletionSignal) {
        self.signal = Some(signal);
    }

    fn client_cert_verified(&self) -> bool {
        self.script.client_cert_ok && !self.script.resumed && self.is_finished()
    }

    fn session_reused(&self) -> bool {
        self.script.resumed
    }

    fn session_id(&self) -> Option<&[u8]> {
        (!self.script.session_id.is_empty()).then_some(&self.script.session_id[..])
    }

    fn alert_sent(&self) -> bool {
        self.alert
    }

    fn allow_session_tickets(&mut self, count: usize) {
        self.tickets += count;
    }

    fn hello_randoms(&self) -> Option<([u8; 32], [u8; 32])> {
        let seed = self.script.secret.to_be_bytes();
        let mut client = [0u8; 32];
        let mut server = [0u8; 32];
        for (i, (c, s)) in client.iter_mut().zip(server.iter_mut()).enumerate() {
            *c = seed[i % 8] ^ i as u8;
            *s = !seed[i % 8] ^ i as u8;
        }
        Some((client, server))
    }

    fn fail(&mut self) {
        self.failed = true;
    }
}
