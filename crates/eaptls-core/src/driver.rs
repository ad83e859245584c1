//! Operation driver: sequences classified fragments against the engine.

use eaptls_proto::{EapMessage, TlsStatus};
use tracing::{debug, error};

use crate::{
    engine::{CompletionSignal, HandshakeEngine, TlsVersion},
    error::TlsError,
    session::{RoundOutcome, Session},
};

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake finished and authentication can succeed
    Success,
    /// Session failed closed
    Fail,
}

/// Where the driver is between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Part of an inbound burst has arrived; ACKs go out until the rest does
    AwaitingFragments,
    /// Ready for the next complete message or outbound fragment
    HandshakeStep,
    /// Nothing more happens in this session
    Finished(Outcome),
}

impl DriverState {
    /// Whether the session has reached a terminal state.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

impl<E: HandshakeEngine> Session<E> {
    /// Advance the handshake with the response just appended to the
    /// inbound buffer.
    pub(crate) fn operate(&mut self, response: &EapMessage, status: TlsStatus) -> RoundOutcome {
        match status {
            TlsStatus::FirstFragment { .. } | TlsStatus::MoreFragments | TlsStatus::MoreFragmentsWithLength => {
                self.state = DriverState::AwaitingFragments;
                self.reply_with_ack(response)
            },
            TlsStatus::LengthIncludedComplete { .. } | TlsStatus::Ok => {
                self.state = DriverState::HandshakeStep;
                match self.handshake_step(response) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(%err, "TLS failed during operation");
                        self.state = DriverState::Finished(Outcome::Fail);
                        RoundOutcome { status: TlsStatus::Fail, reply: None, restored: None }
                    },
                }
            },
            TlsStatus::Ack
            | TlsStatus::Invalid
            | TlsStatus::Handled
            | TlsStatus::NeedsRequest
            | TlsStatus::Success
            | TlsStatus::Fail => {
                error!(%status, "operation driver cannot act on status");
                RoundOutcome { status: TlsStatus::Fail, reply: None, restored: None }
            },
        }
    }

    fn handshake_step(&mut self, response: &EapMessage) -> Result<RoundOutcome, TlsError> {
        let record = self.inbound.take();
        debug!(len = record.len(), "feeding complete TLS message to engine");
        if let Err(err) = self.engine.receive(&record) {
            self.engine.fail();
            return Err(err.into());
        }
        self.handshake_finished = self.engine.is_finished();
        self.collect_engine_output();

        if self.completion_due() {
            if self.config.eap_type == EapMessage::TYPE_TLS || self.engine.session_reused() {
                self.authentication_success = true;
                let signal = if self.config.tls13_send_zero {
                    debug!("TLS send Commitment Message");
                    CompletionSignal::CommitmentMessage
                } else {
                    debug!("TLS sending close_notify");
                    CompletionSignal::CloseNotify
                };
                self.engine.signal_completion(signal);
            } else if self.config.session_cache_enable {
                self.engine.allow_session_tickets(1);
            }

            if let Err(err) = self.engine.send() {
                self.engine.fail();
                return Err(err.into());
            }
            self.collect_engine_output();
        }

        if !self.outbound.is_empty() {
            return Ok(self.reply_with_fragment(response));
        }

        if self.handshake_finished {
            self.state = DriverState::Finished(Outcome::Success);
            return Ok(RoundOutcome { status: TlsStatus::Success, reply: None, restored: None });
        }

        Err(TlsError::HandshakeIncomplete)
    }

    // Only TLS 1.3 needs an explicit end-of-handshake signal
    fn completion_due(&self) -> bool {
        self.engine.negotiated_version() == Some(TlsVersion::NEWEST)
            && (self.engine.client_cert_verified() || self.authentication_success || self.engine.session_reused())
            && self.outbound.is_empty()
    }
}
