//! World state for scenario execution.
//!
//! The World records everything a conversation produced, and keeps the
//! session and peer as they were at the end, for oracles to inspect.

use eaptls_core::{RestoredAttributes, Session, SessionKeys, attribute::AttributeList};
use eaptls_proto::{Code, EapMessage, TlsStatus};

use crate::{engine::ScriptedEngine, peer::Peer};

/// Everything one conversation left behind.
#[derive(Debug, Default)]
pub struct World {
    requests: Vec<EapMessage>,
    responses: Vec<EapMessage>,
    statuses: Vec<TlsStatus>,
    restored: Option<RestoredAttributes>,
    keys: Option<SessionKeys>,
    request_attributes: AttributeList,
    session: Option<Session<ScriptedEngine>>,
    peer: Option<Peer>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&mut self, request: EapMessage) {
        self.requests.push(request);
    }

    pub(crate) fn record_response(&mut self, response: EapMessage) {
        self.responses.push(response);
    }

    pub(crate) fn record_status(&mut self, status: TlsStatus) {
        self.statuses.push(status);
    }

    pub(crate) fn record_restored(&mut self, restored: RestoredAttributes) {
        self.restored = Some(restored);
    }

    pub(crate) fn record_keys(&mut self, keys: SessionKeys) {
        self.keys = Some(keys);
    }

    pub(crate) fn finish(&mut self, session: Session<ScriptedEngine>, peer: Peer, request_attributes: AttributeList) {
        self.session = Some(session);
        self.peer = Some(peer);
        self.request_attributes = request_attributes;
    }

    /// Messages the server sent, Start first.
    pub fn requests(&self) -> &[EapMessage] {
        &self.requests
    }

    /// Messages the peer sent.
    pub fn responses(&self) -> &[EapMessage] {
        &self.responses
    }

    /// Status of every processed round.
    pub fn statuses(&self) -> &[TlsStatus] {
        &self.statuses
    }

    /// Number of rounds processed.
    pub fn rounds(&self) -> usize {
        self.statuses.len()
    }

    /// Attributes restored on resumption.
    pub fn restored(&self) -> Option<&RestoredAttributes> {
        self.restored.as_ref()
    }

    /// Keys derived on success.
    pub fn keys(&self) -> Option<&SessionKeys> {
        self.keys.as_ref()
    }

    /// Request attributes after the last round.
    pub fn request_attributes(&self) -> &AttributeList {
        &self.request_attributes
    }

    /// The session, once the conversation ended.
    pub fn session(&self) -> Option<&Session<ScriptedEngine>> {
        self.session.as_ref()
    }

    /// The peer, once the conversation ended.
    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    /// Success or Failure as the peer saw it.
    pub fn final_code(&self) -> Option<Code> {
        self.peer.as_ref().and_then(Peer::finished)
    }

    /// Whether the conversation ended in EAP-Success.
    pub fn succeeded(&self) -> bool {
        self.final_code() == Some(Code::Success)
    }

    /// Server data fragments (requests carrying TLS bytes).
    pub fn server_fragments(&self) -> usize {
        self.requests.iter().filter(|r| r.code == Code::Request && r.type_data.len() > 1).count()
    }

    /// Server ACKs (requests carrying only the flag byte, Start excluded).
    pub fn server_acks(&self) -> usize {
        self.requests
            .iter()
            .skip(1)
            .filter(|r| r.code == Code::Request && r.type_data.len() == 1)
            .count()
    }
}
