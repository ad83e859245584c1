//! Property tests for fragmentation and reassembly.
//!
//! Random flight sizes, MTUs and seeds are pushed through complete
//! conversations. Whatever either side sends must arrive intact, in the
//! expected number of fragments.

use bytes::Bytes;
use eaptls_core::TlsConfig;
use eaptls_harness::{EngineScript, PeerScript, Simulation};
use proptest::prelude::*;

fn patterned(len: usize, salt: u8) -> Bytes {
    (0..len).map(|i| (i as u8).wrapping_mul(31) ^ salt).collect::<Vec<_>>().into()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn server_burst_leaves_in_ceil_len_over_mtu_fragments(
        len in 1usize..20_000,
        fragment_size in 120usize..=4000,
        include_length in any::<bool>(),
    ) {
        let config = TlsConfig { fragment_size, include_length, ..TlsConfig::default() };
        let mtu = config.validate().unwrap();
        let burst = patterned(len, 0x5a);

        let world = Simulation::new(config, 1)
            .engine(EngineScript { server_flights: vec![burst.clone()], ..EngineScript::default() })
            .peer(PeerScript {
                client_flights: vec![Bytes::from_static(b"hello"), Bytes::from_static(b"finished")],
                ..PeerScript::default()
            })
            .run()
            .unwrap();

        prop_assert!(world.succeeded());
        prop_assert_eq!(world.server_fragments(), len.div_ceil(mtu));
        prop_assert_eq!(world.peer().unwrap().received(), &[burst][..]);
    }

    #[test]
    fn irregular_peer_flights_reassemble_exactly(
        seed in any::<u64>(),
        first in 1usize..6000,
        second in 1usize..6000,
        mtu in 1usize..1500,
    ) {
        let flights = vec![patterned(first, 1), patterned(second, 2)];
        let world = Simulation::new(TlsConfig::default(), seed)
            .engine(EngineScript { server_flights: vec![patterned(64, 3)], ..EngineScript::default() })
            .peer(PeerScript { client_flights: flights.clone(), mtu, irregular: true, ..PeerScript::default() })
            .max_rounds(20_000)
            .run()
            .unwrap();

        prop_assert!(world.succeeded());
        let session = world.session().unwrap();
        prop_assert_eq!(session.engine().received(), &flights[..]);
    }

    #[test]
    fn same_seed_same_transcript(seed in any::<u64>()) {
        let run = || {
            Simulation::new(TlsConfig::default(), seed)
                .engine(EngineScript { server_flights: vec![patterned(2500, 4)], ..EngineScript::default() })
                .peer(PeerScript {
                    client_flights: vec![patterned(900, 5), patterned(1800, 6)],
                    mtu: 400,
                    irregular: true,
                    ..PeerScript::default()
                })
                .run()
                .unwrap()
        };

        let a = run();
        let b = run();
        prop_assert_eq!(a.requests(), b.requests());
        prop_assert_eq!(a.responses(), b.responses());
        prop_assert_eq!(a.keys(), b.keys());
    }
}
