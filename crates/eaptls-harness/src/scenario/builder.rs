//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use bytes::Bytes;
use eaptls_core::{MemoryResumptionCache, TlsConfig, TlsVersion, attribute::AttributeList};

use crate::{
    engine::EngineScript,
    peer::PeerScript,
    scenario::OracleFn,
    sim::Simulation,
};

/// Scenario builder.
///
/// Describe both ends of the conversation, then call `.oracle()` to get a
/// [`RunnableScenario`].
pub struct Scenario {
    name: String,
    seed: u64,
    config: TlsConfig,
    engine: EngineScript,
    peer: PeerScript,
    cache: MemoryResumptionCache,
    certificate_attributes: AttributeList,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            config: TlsConfig::default(),
            engine: EngineScript::default(),
            peer: PeerScript::default(),
            cache: MemoryResumptionCache::new(),
            certificate_attributes: AttributeList::new(),
        }
    }

    /// RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Server configuration.
    pub fn config(mut self, config: TlsConfig) -> Self {
        self.peer.eap_type = config.eap_type;
        self.config = config;
        self
    }

    /// Negotiated TLS version.
    pub fn version(mut self, version: TlsVersion) -> Self {
        self.engine.version = version;
        self
    }

    /// Client flights, in order.
    pub fn client_flights(mut self, flights: impl IntoIterator<Item = Bytes>) -> Self {
        self.peer.client_flights = flights.into_iter().collect();
        self
    }

    /// Server flights, one per client flight.
    pub fn server_flights(mut self, flights: impl IntoIterator<Item = Bytes>) -> Self {
        self.engine.server_flights = flights.into_iter().collect();
        self
    }

    /// Client messages before the handshake is finished.
    pub fn finish_after(mut self, messages: usize) -> Self {
        self.engine.finish_after = messages;
        self
    }

    /// Peer fragment size; `irregular` draws each size from `1..=mtu`.
    pub fn peer_mtu(mut self, mtu: usize, irregular: bool) -> Self {
        self.peer.mtu = mtu;
        self.peer.irregular = irregular;
        self
    }

    /// Peer puts the length field on every fragment.
    pub fn peer_includes_length(mut self) -> Self {
        self.peer.include_length = true;
        self
    }

    /// Resume a cached session with the given id.
    pub fn resumed(mut self, session_id: &[u8], cache: MemoryResumptionCache) -> Self {
        self.engine.resumed = true;
        self.engine.session_id = session_id.to_vec();
        self.cache = cache;
        self
    }

    /// Replace the whole engine script.
    pub fn engine(mut self, script: EngineScript) -> Self {
        self.engine = script;
        self
    }

    /// Certificate attributes produced by validation.
    pub fn certificate_attributes(mut self, attrs: AttributeList) -> Self {
        self.certificate_attributes = attrs;
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Run the conversation, then the oracle.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, seed, config, engine, peer, cache, certificate_attributes } = self.scenario;

        let world = Simulation::new(config, seed)
            .engine(engine)
            .peer(peer)
            .cache(cache)
            .certificate_attributes(certificate_attributes)
            .run()
            .map_err(|e| format!("Scenario '{name}': {e}"))?;

        (self.oracle)(&world).map_err(|e| format!("Scenario '{name}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_requires_oracle() {
        // This should compile - oracle provided
        let _scenario = Scenario::new("test").oracle(Box::new(|_world| Ok(())));

        // This should NOT compile - no oracle
        // let scenario = Scenario::new("test");
        // scenario.run(); // ERROR: no method `run` on type `Scenario`
    }

    #[test]
    fn oracle_error_names_the_scenario() {
        let result = Scenario::new("doomed")
            .client_flights([Bytes::from_static(b"hello"), Bytes::from_static(b"finished")])
            .server_flights([Bytes::from_static(b"server hello")])
            .oracle(Box::new(|_| Err("nope".into())))
            .run();

        assert_eq!(result, Err("Scenario 'doomed': nope".to_string()));
    }
}
