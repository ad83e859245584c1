//! Scripted engine for unit tests.

use crate::engine::{CompletionSignal, EngineError, HandshakeEngine, TlsVersion};

#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    pub version: Option<TlsVersion>,
    /// Number of `receive` calls after which the handshake is finished
    pub finish_after: Option<usize>,
    pub cert_verified: bool,
    pub reused: bool,
    pub session_id: Option<Vec<u8>>,
    pub randoms: Option<([u8; 32], [u8; 32])>,
    /// One flight per `receive`, popped from the front
    pub respond_with: Vec<Vec<u8>>,
    /// Emitted by `send`
    pub send_output: Vec<u8>,
    pub receive_error: Option<EngineError>,
    pub alert: bool,

    pub received: Vec<Vec<u8>>,
    pub signals: Vec<CompletionSignal>,
    pub tickets: usize,
    pub failed: bool,
    pub pending: Vec<u8>,
}

impl HandshakeEngine for MockEngine {
    fn receive(&mut self, data: &[u8]) -> Result<(), EngineError> {
        if let Some(err) = self.receive_error.clone() {
            return Err(err);
        }
        self.received.push(data.to_vec());

        if !self.respond_with.is_empty() {
            let flight = self.respond_with.remove(0);
            self.pending.extend_from_slice(&flight);
        }
        Ok(())
    }

    fn send(&mut self) -> Result<(), EngineError> {
        let out = std::mem::take(&mut self.send_output);
        self.pending.extend_from_slice(&out);
        Ok(())
    }

    fn pending_outbound(&self) -> &[u8] {
        &self.pending
    }

    fn clear_outbound(&mut self) {
        self.pending.clear();
    }

    fn is_finished(&self) -> bool {
        self.finish_after.is_some_and(|n| self.received.len() >= n)
    }

    fn negotiated_version(&self) -> Option<TlsVersion> {
        self.version
    }

    fn export_key(&self, label: &str, context: Option<&[u8]>, out: &mut [u8]) -> Result<(), EngineError> {
        if self.version.is_none() {
            return Err(EngineError::Export("no session".into()));
        }
        let seed = label.bytes().fold(context.map_or(0u8, |c| c.len() as u8), u8::wrapping_add);
        for (i, b) in out.iter_mut().enumerate() {
            *b = seed.wrapping_add(i as u8);
        }
        Ok(())
    }

    fn signal_completion(&mut self, signal: CompletionSignal) {
        self.signals.push(signal);
    }

    fn client_cert_verified(&self) -> bool {
        self.cert_verified
    }

    fn session_reused(&self) -> bool {
        self.reused
    }

    fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_deref()
    }

    fn alert_sent(&self) -> bool {
        self.alert
    }

    fn allow_session_tickets(&mut self, count: usize) {
        self.tickets += count;
    }

    fn hello_randoms(&self) -> Option<([u8; 32], [u8; 32])> {
        self.randoms
    }

    fn fail(&mut self) {
        self.failed = true;
    }
}
