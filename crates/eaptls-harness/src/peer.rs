//! Simulated supplicant.
//!
//! The peer answers each EAP-Request the way a conforming supplicant does:
//! it reassembles fragmented server flights, ACKs every fragment but the
//! last, and sends its own flights fragmented at its own MTU. Fragment
//! sizes can be drawn at random to exercise irregular peers.

use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use eaptls_proto::{Code, EapMessage, TlsFlags, packet};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::HarnessError;

/// How the peer behaves.
#[derive(Debug, Clone)]
pub struct PeerScript {
    /// Flights sent in order, one after each complete server flight
    pub client_flights: Vec<Bytes>,
    /// Largest fragment payload the peer sends
    pub mtu: usize,
    /// Draw each fragment size uniformly from `1..=mtu`
    pub irregular: bool,
    /// Put the length field on every fragment, not just the first
    pub include_length: bool,
    /// EAP method type
    pub eap_type: u8,
}

impl Default for PeerScript {
    fn default() -> Self {
        Self {
            client_flights: Vec::new(),
            mtu: 1014,
            irregular: false,
            include_length: false,
            eap_type: EapMessage::TYPE_TLS,
        }
    }
}

/// Supplicant state.
#[derive(Debug)]
pub struct Peer {
    script: PeerScript,
    rng: ChaCha8Rng,
    flights: VecDeque<Bytes>,
    outgoing: Bytes,
    outgoing_total: u32,
    sending: bool,
    reassembly: BytesMut,
    received: Vec<Bytes>,
    fragments_sent: usize,
    acks_sent: usize,
    finished: Option<Code>,
}

impl Peer {
    /// Peer following `script`, drawing fragment sizes from `rng`.
    pub fn new(script: PeerScript, rng: ChaCha8Rng) -> Self {
        let flights = script.client_flights.iter().cloned().collect();
        Self {
            script,
            rng,
            flights,
            outgoing: Bytes::new(),
            outgoing_total: 0,
            sending: false,
            reassembly: BytesMut::new(),
            received: Vec::new(),
            fragments_sent: 0,
            acks_sent: 0,
            finished: None,
        }
    }

    /// Server flights reassembled so far.
    pub fn received(&self) -> &[Bytes] {
        &self.received
    }

    /// Data fragments sent.
    pub fn fragments_sent(&self) -> usize {
        self.fragments_sent
    }

    /// ACKs and empty responses sent.
    pub fn acks_sent(&self) -> usize {
        self.acks_sent
    }

    /// Success or Failure, once seen.
    pub fn finished(&self) -> Option<Code> {
        self.finished
    }

    /// Answer one message from the server.
    ///
    /// Returns `None` once the conversation has ended.
    pub fn respond(&mut self, request: &EapMessage) -> Result<Option<EapMessage>, HarnessError> {
        match request.code {
            Code::Success | Code::Failure => {
                debug!(code = ?request.code, "peer saw end of conversation");
                self.finished = Some(request.code);
                return Ok(None);
            },
            Code::Response => return Err(HarnessError::Peer("peer received a Response".into())),
            Code::Request => {},
        }

        let Some(&flag_byte) = request.type_data.first() else {
            return Err(HarnessError::Peer("request without EAP-TLS flags".into()));
        };
        let flags = TlsFlags::from_byte(flag_byte);

        if flags.start() {
            trace!(id = request.id, "peer got Start");
            return Ok(Some(self.begin_next_flight(request.id)));
        }

        let payload = if flags.length_included() {
            if packet::declared_length(&request.type_data).is_err() {
                return Err(HarnessError::Peer("length bit set without length field".into()));
            }
            &request.type_data[packet::LENGTH_PREFIX_LEN..]
        } else {
            &request.type_data[packet::FLAGS_LEN..]
        };

        // Flags only: the server acknowledged our last fragment
        if payload.is_empty() && !flags.more_fragments() && !flags.length_included() {
            if !self.sending {
                return Err(HarnessError::Peer("ACK with no fragment outstanding".into()));
            }
            return Ok(Some(self.next_fragment(request.id)));
        }

        self.reassembly.put_slice(payload);
        if flags.more_fragments() {
            return Ok(Some(self.ack(request.id)));
        }

        let flight = self.reassembly.split().freeze();
        debug!(len = flight.len(), "peer reassembled server flight");
        self.received.push(flight);
        Ok(Some(self.begin_next_flight(request.id)))
    }

    fn begin_next_flight(&mut self, id: u8) -> EapMessage {
        match self.flights.pop_front() {
            Some(flight) => {
                self.outgoing_total = flight.len() as u32;
                self.outgoing = flight;
                self.sending = true;
                self.next_fragment(id)
            },
            None => self.ack(id),
        }
    }

    fn next_fragment(&mut self, id: u8) -> EapMessage {
        let first = self.outgoing.len() == self.outgoing_total as usize;
        let mtu = self.script.mtu.max(1);
        let size = if self.script.irregular { self.rng.gen_range(1..=mtu) } else { mtu };
        let size = size.min(self.outgoing.len());
        let fragment = self.outgoing.split_to(size);
        let more = !self.outgoing.is_empty();
        self.sending = more;

        let mut flags = TlsFlags::empty();
        if more {
            flags |= TlsFlags::MORE_FRAGMENTS;
        }
        let with_length = (first && more) || self.script.include_length;

        let mut data = BytesMut::with_capacity(packet::LENGTH_PREFIX_LEN + fragment.len());
        if with_length {
            flags |= TlsFlags::LENGTH_INCLUDED;
        }
        data.put_u8(flags.bits());
        if with_length {
            data.put_u32(self.outgoing_total);
        }
        data.put_slice(&fragment);

        self.fragments_sent += 1;
        trace!(id, size, more, "peer sending fragment");
        EapMessage::new(Code::Response, id, self.script.eap_type, data.freeze())
    }

    fn ack(&mut self, id: u8) -> EapMessage {
        self.acks_sent += 1;
        EapMessage::new(Code::Response, id, self.script.eap_type, vec![TlsFlags::empty().bits()])
    }
}
