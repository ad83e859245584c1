//! Conversation runner.
//!
//! Plays a [`Session`] against a [`Peer`] until the peer sees Success or
//! Failure. Everything is driven from one seeded RNG, so a seed reproduces
//! the same conversation byte for byte.

use eaptls_core::{
    MemoryResumptionCache, NoTunnel, RoundContext, Session, TlsConfig, attribute::AttributeList,
};
use eaptls_proto::TlsStatus;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, info_span, warn};

use crate::{
    HarnessError,
    engine::{EngineScript, ScriptedEngine},
    peer::{Peer, PeerScript},
    scenario::World,
};

/// Rounds after which a conversation is considered stuck
pub const DEFAULT_MAX_ROUNDS: usize = 512;

/// One simulated authentication.
#[derive(Debug)]
pub struct Simulation {
    config: TlsConfig,
    engine: EngineScript,
    peer: PeerScript,
    cache: MemoryResumptionCache,
    certificate_attributes: AttributeList,
    seed: u64,
    max_rounds: usize,
}

impl Simulation {
    /// New simulation with default scripts.
    pub fn new(config: TlsConfig, seed: u64) -> Self {
        Self {
            config,
            engine: EngineScript::default(),
            peer: PeerScript::default(),
            cache: MemoryResumptionCache::new(),
            certificate_attributes: AttributeList::new(),
            seed,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Replace the engine script.
    pub fn engine(mut self, script: EngineScript) -> Self {
        self.engine = script;
        self
    }

    /// Replace the peer script.
    pub fn peer(mut self, script: PeerScript) -> Self {
        self.peer = script;
        self
    }

    /// Resumption cache the session consults.
    pub fn cache(mut self, cache: MemoryResumptionCache) -> Self {
        self.cache = cache;
        self
    }

    /// Certificate attributes merged into each round's request.
    pub fn certificate_attributes(mut self, attrs: AttributeList) -> Self {
        self.certificate_attributes = attrs;
        self
    }

    /// Round limit.
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Run the conversation to its end.
    pub fn run(self) -> Result<World, HarnessError> {
        let _span = info_span!("sim", seed = self.seed).entered();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let first_id: u8 = rng.gen_range(0..=u8::MAX);

        let mut session = Session::new(ScriptedEngine::new(self.engine), self.config)?;
        session.set_certificate_attributes(self.certificate_attributes);
        let mut peer = Peer::new(self.peer, ChaCha8Rng::seed_from_u64(rng.next_u64()));
        let mut world = World::new();
        let mut request_attributes = AttributeList::new();
        let mut tunnel = NoTunnel;

        let mut request = session.start(first_id);
        for _ in 0..self.max_rounds {
            world.record_request(request.clone());
            let Some(response) = peer.respond(&request)? else {
                info!(code = ?peer.finished(), rounds = world.rounds(), "conversation finished");
                world.finish(session, peer, request_attributes);
                return Ok(world);
            };
            world.record_response(response.clone());

            let mut ctx = RoundContext::new(&mut request_attributes, &self.cache, &mut tunnel);
            let outcome = session.process(&response, &mut ctx);
            debug!(status = %outcome.status, "round complete");
            world.record_status(outcome.status);
            if let Some(restored) = outcome.restored {
                world.record_restored(restored);
            }

            request = match outcome.status {
                TlsStatus::Handled => outcome.reply.ok_or(HarnessError::MissingReply)?,
                TlsStatus::Success => {
                    let done = session.success(response.id)?;
                    if let Some(keys) = done.keys {
                        world.record_keys(keys);
                    }
                    done.reply
                },
                status => {
                    warn!(%status, "round failed, sending EAP-Failure");
                    session.fail(response.id)
                },
            };
        }

        Err(HarnessError::RoundLimit(self.max_rounds))
    }
}
