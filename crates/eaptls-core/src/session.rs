//! EAP-TLS session: the per-round entry point.
//!
//! # Architecture
//!
//! A [`Session`] is a pure state machine. It is handed one EAP-Response per
//! round and returns a [`RoundOutcome`] describing what to send back and
//! whether the handshake concluded. It performs no I/O; the caller owns
//! transport, retransmission and timeouts.
//!
//! # Round
//!
//! ```text
//! Response ──> classify ──┬─ Invalid / Fail ───────────────> done
//!                         ├─ Ack ──> next fragment / Success / Fail
//!                         └─ data ──> extract ──> append
//!                                          │
//!                    handshake finished? ──┼─ yes ──> ACK or tunnel data
//!                                          └─ no  ──> operation driver
//!                                                       │
//!                                     fresh Success ────┴──> restore cached attributes
//! ```
//!
//! Rounds are serialized upstream: at most one is in flight per session.

use bytes::Bytes;
use eaptls_proto::{EapMessage, TlsFlags, TlsPacket, TlsReply, TlsStatus};
use tracing::{debug, error, info, info_span, warn};

use crate::{
    attribute::{AttributeList, merge_one},
    classify::{self, Counters, PreviousRound},
    config::TlsConfig,
    driver::{DriverState, Outcome},
    engine::HandshakeEngine,
    error::{ConfigError, TlsError},
    fragment::Fragmenter,
    keying::{self, SessionKeys},
    record::{OutboundBuffer, RecordBuffer},
    restore::{self, RestoredAttributes},
    resumption::ResumptionCache,
};

/// Receives application data once the handshake has finished.
///
/// Tunnelled methods (PEAP, TTLS) implement this. Plain EAP-TLS has no
/// application phase and uses [`NoTunnel`].
pub trait TunnelHandler {
    /// Handle one reassembled inbound record and report the round status.
    ///
    /// Returning [`TlsStatus::NeedsRequest`] or [`TlsStatus::Handled`] asks
    /// the session to send whatever the engine has queued. The round fails
    /// if the engine queued nothing.
    fn on_application_data(&mut self, record: Bytes) -> TlsStatus;
}

/// Tunnel handler for methods without an application phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTunnel;

impl TunnelHandler for NoTunnel {
    fn on_application_data(&mut self, record: Bytes) -> TlsStatus {
        warn!(len = record.len(), "unexpected application data after handshake");
        TlsStatus::Fail
    }
}

/// Collaborators lent to the session for the duration of one round.
pub struct RoundContext<'a> {
    /// Inbound request attributes; known certificate attributes are merged in
    pub request: &'a mut AttributeList,
    /// Attribute cache consulted on resumption
    pub cache: &'a dyn ResumptionCache,
    /// Post-handshake application data handler
    pub tunnel: &'a mut dyn TunnelHandler,
}

impl<'a> RoundContext<'a> {
    /// Bundle the collaborators for one round.
    pub fn new(
        request: &'a mut AttributeList,
        cache: &'a dyn ResumptionCache,
        tunnel: &'a mut dyn TunnelHandler,
    ) -> Self {
        Self { request, cache, tunnel }
    }
}

/// Result of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Final status of the round
    pub status: TlsStatus,
    /// EAP-Request to send, if the conversation continues
    pub reply: Option<EapMessage>,
    /// Attributes restored from the resumption cache; present only on the
    /// round that first reached success on a resumed session
    pub restored: Option<RestoredAttributes>,
}

impl RoundOutcome {
    fn status(status: TlsStatus) -> Self {
        Self { status, reply: None, restored: None }
    }
}

/// Output of [`Session::success`].
#[derive(Debug, Clone)]
pub struct SuccessOutcome {
    /// EAP-Success to send
    pub reply: EapMessage,
    /// Key material, absent when no label is configured for this version
    pub keys: Option<SessionKeys>,
}

/// One EAP-TLS authentication attempt.
#[derive(Debug)]
pub struct Session<E> {
    pub(crate) engine: E,
    pub(crate) config: TlsConfig,
    pub(crate) inbound: RecordBuffer,
    pub(crate) outbound: OutboundBuffer,
    pub(crate) fragmenter: Fragmenter,
    pub(crate) counters: Counters,
    pub(crate) previous: PreviousRound,
    pub(crate) state: DriverState,
    pub(crate) handshake_finished: bool,
    pub(crate) authentication_success: bool,
    attributes_restored: bool,
    finished: bool,
    certs: AttributeList,
}

impl<E: HandshakeEngine> Session<E> {
    /// Open a session around `engine`.
    pub fn new(engine: E, config: TlsConfig) -> Result<Self, ConfigError> {
        let mtu = config.validate()?;
        Ok(Self {
            engine,
            inbound: RecordBuffer::new(config.max_record_size as usize),
            outbound: OutboundBuffer::new(),
            fragmenter: Fragmenter::new(mtu, config.include_length, config.passthrough()),
            counters: Counters::default(),
            previous: PreviousRound::default(),
            state: DriverState::HandshakeStep,
            handshake_finished: false,
            authentication_success: false,
            attributes_restored: false,
            finished: false,
            certs: AttributeList::new(),
            config,
        })
    }

    /// The handshake engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The handshake engine, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Reassembly counters for the current inbound burst.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// What the previous round left behind.
    pub fn previous_round(&self) -> PreviousRound {
        self.previous
    }

    /// Operation driver state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Whether the TLS handshake has finished.
    pub fn is_handshake_finished(&self) -> bool {
        self.handshake_finished
    }

    /// Whether Success or Failure has been composed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes still waiting to be fragmented out.
    pub fn outbound_pending(&self) -> usize {
        self.outbound.remaining()
    }

    /// Certificate attributes produced by validation, merged into the
    /// request on every round.
    pub fn set_certificate_attributes(&mut self, certs: AttributeList) {
        self.certs = certs;
    }

    /// Compose the EAP-TLS Start request.
    pub fn start(&mut self, id: u8) -> EapMessage {
        debug!(id, "sending EAP-TLS Start");
        self.previous.request_id = Some(id);
        TlsReply::start(self.config.passthrough()).compose().into_message(id, self.config.eap_type)
    }

    /// Process one EAP-Response.
    pub fn process(&mut self, response: &EapMessage, ctx: &mut RoundContext<'_>) -> RoundOutcome {
        let _span = info_span!("eaptls", id = response.id).entered();
        if self.finished || self.state == DriverState::Finished(Outcome::Fail) {
            error!(state = ?self.state, "session already finished, rejecting response");
            return RoundOutcome::status(TlsStatus::Fail);
        }
        debug!("continuing EAP-TLS");

        for cert in &self.certs {
            merge_one(ctx.request, cert);
        }

        let status = classify::classify(response, &self.previous, &mut self.counters);
        if status.is_failure() {
            error!(%status, "eaptls verify");
        } else {
            info!(%status, "eaptls verify");
        }

        if status == TlsStatus::Invalid {
            return RoundOutcome::status(status);
        }
        let flags = response.type_data.first().map_or(TlsFlags::empty(), |&b| TlsFlags::from_byte(b));
        self.previous.response_flags = Some(flags);

        let outcome = match status {
            TlsStatus::Fail => RoundOutcome::status(TlsStatus::Fail),
            TlsStatus::Ack => self.on_ack(response, ctx),
            _ => self.on_data(response, status, ctx),
        };

        if outcome.status == TlsStatus::Fail {
            self.state = DriverState::Finished(Outcome::Fail);
        }
        outcome
    }

    /// Compose EAP-Success and derive key material.
    pub fn success(&mut self, response_id: u8) -> Result<SuccessOutcome, TlsError> {
        self.finished = true;
        self.state = DriverState::Finished(Outcome::Success);
        let reply = TlsReply::success(self.config.passthrough()).compose().into_message(response_id, self.config.eap_type);

        let keys = match keying::derive(&self.engine, self.config.prf_label.as_deref(), self.config.eap_type) {
            Ok(keys) => Some(keys),
            Err(TlsError::MissingPrfLabel) => {
                warn!("not adding MPPE keys because there is no PRF label");
                None
            },
            Err(err) => return Err(err),
        };

        Ok(SuccessOutcome { reply, keys })
    }

    /// Compose EAP-Failure and fail the TLS session.
    pub fn fail(&mut self, response_id: u8) -> EapMessage {
        self.finished = true;
        self.state = DriverState::Finished(Outcome::Fail);
        self.engine.fail();
        TlsReply::fail(self.config.passthrough()).compose().into_message(response_id, self.config.eap_type)
    }

    /// Wrap a continuing reply, bumping the identifier.
    pub(crate) fn request_message(&mut self, response: &EapMessage, reply: &TlsReply) -> EapMessage {
        let id = response.id.wrapping_add(1);
        self.previous.request_id = Some(id);
        reply.compose().into_message(id, self.config.eap_type)
    }

    pub(crate) fn reply_with_ack(&mut self, response: &EapMessage) -> RoundOutcome {
        debug!("ACKing peer's TLS record fragment");
        let ack = TlsReply::ack(self.config.passthrough());
        let reply = self.request_message(response, &ack);
        RoundOutcome { status: TlsStatus::Handled, reply: Some(reply), restored: None }
    }

    pub(crate) fn reply_with_fragment(&mut self, response: &EapMessage) -> RoundOutcome {
        let fragment = self.fragmenter.next_fragment(&mut self.outbound);
        let reply = self.request_message(response, &fragment);
        RoundOutcome { status: TlsStatus::Handled, reply: Some(reply), restored: None }
    }

    /// Move whatever the engine produced into the outbound store.
    pub(crate) fn collect_engine_output(&mut self) {
        let pending = self.engine.pending_outbound();
        if !pending.is_empty() {
            self.outbound.extend(pending);
            self.engine.clear_outbound();
        }
    }

    fn on_ack(&mut self, response: &EapMessage, ctx: &RoundContext<'_>) -> RoundOutcome {
        match self.ack_status() {
            TlsStatus::NeedsRequest => self.reply_with_fragment(response),
            TlsStatus::Success => {
                self.state = DriverState::Finished(Outcome::Success);
                let mut outcome = RoundOutcome::status(TlsStatus::Success);
                outcome.restored = self.restore_cached(ctx);
                outcome
            },
            status => RoundOutcome::status(status),
        }
    }

    fn ack_status(&mut self) -> TlsStatus {
        if self.engine.alert_sent() {
            error!("peer acknowledged a TLS alert");
            return TlsStatus::Fail;
        }
        if !self.outbound.is_empty() {
            return TlsStatus::NeedsRequest;
        }
        if self.handshake_finished {
            return TlsStatus::Success;
        }
        error!("received ACK with nothing left to send and handshake incomplete");
        TlsStatus::Fail
    }

    fn on_data(&mut self, response: &EapMessage, status: TlsStatus, ctx: &mut RoundContext<'_>) -> RoundOutcome {
        if let Err(err) = self.append_fragment(response, status) {
            error!(%err, "failed extracting TLS packet from EAP-Message");
            return RoundOutcome::status(TlsStatus::Fail);
        }

        if self.handshake_finished {
            if status.fragment_pending() {
                debug!("init is done, but tunneled data is fragmented");
                return self.reply_with_ack(response);
            }

            let record = self.inbound.take();
            return match ctx.tunnel.on_application_data(record) {
                TlsStatus::NeedsRequest | TlsStatus::Handled => {
                    self.collect_engine_output();
                    if self.outbound.is_empty() {
                        error!("tunnel handled application data but queued no reply");
                        RoundOutcome::status(TlsStatus::Fail)
                    } else {
                        self.reply_with_fragment(response)
                    }
                },
                status => RoundOutcome::status(status),
            };
        }

        let mut outcome = self.operate(response, status);
        if outcome.status == TlsStatus::Success {
            outcome.restored = self.restore_cached(ctx);
        }
        outcome
    }

    fn append_fragment(&mut self, response: &EapMessage, status: TlsStatus) -> Result<(), TlsError> {
        let packet = TlsPacket::extract(response, status, self.config.max_record_size)?;
        let appended = self.inbound.append(&packet.data);
        if appended != packet.data.len() {
            return Err(TlsError::RecordOverflow { len: packet.data.len(), remaining: self.inbound.remaining() });
        }
        Ok(())
    }

    fn restore_cached(&mut self, ctx: &RoundContext<'_>) -> Option<RestoredAttributes> {
        if self.attributes_restored || !self.engine.session_reused() {
            return None;
        }
        let id = self.engine.session_id()?;
        let session_id = hex::encode(id);

        let Some(cached) = ctx.cache.lookup(id).filter(|attrs| !attrs.is_empty()) else {
            warn!(session = %session_id, "no information in cached session");
            return None;
        };

        info!(session = %session_id, count = cached.len(), "adding cached attributes from session");
        let mut restored = RestoredAttributes::default();
        restore::dispatch(&cached, &self.config.session_state_attributes, !self.certs.is_empty(), &mut restored);
        self.attributes_restored = true;
        Some(restored)
    }
}
