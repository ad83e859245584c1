//! Command-line EAP-TLS conversation simulator.

use bytes::Bytes;
use clap::Parser;
use eaptls_core::{TlsConfig, TlsVersion};
use eaptls_harness::{EngineScript, PeerScript, Simulation};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Simulate one EAP-TLS authentication between a scripted server and peer
#[derive(Parser, Debug)]
#[command(name = "eaptls-sim")]
#[command(about = "Deterministic EAP-TLS fragmentation simulator", long_about = None)]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Server fragment size, header overhead included
    #[arg(long, default_value_t = 1024)]
    fragment_size: usize,

    /// Largest reassembled TLS message
    #[arg(long, default_value_t = 65536)]
    max_record_size: u32,

    /// Only put the length field on the first fragment of a burst
    #[arg(long)]
    first_fragment_length_only: bool,

    /// Negotiate TLS 1.3
    #[arg(long)]
    tls13: bool,

    /// Use the one-byte commitment message instead of close_notify
    #[arg(long)]
    send_zero: bool,

    /// Sizes of the client flights, comma separated
    #[arg(long, value_delimiter = ',', default_value = "300,1800")]
    client_flights: Vec<usize>,

    /// Sizes of the server flights, comma separated
    #[arg(long, value_delimiter = ',', default_value = "4200")]
    server_flights: Vec<usize>,

    /// Peer fragment size
    #[arg(long, default_value_t = 1014)]
    peer_mtu: usize,

    /// Draw peer fragment sizes at random
    #[arg(long)]
    irregular: bool,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn flights(sizes: &[usize], fill: u8) -> Vec<Bytes> {
    sizes.iter().map(|&len| Bytes::from(vec![fill; len])).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = TlsConfig {
        fragment_size: args.fragment_size,
        max_record_size: args.max_record_size,
        include_length: !args.first_fragment_length_only,
        tls13_send_zero: args.send_zero,
        ..TlsConfig::default()
    };
    if let Err(err) = config.validate() {
        error!(%err, "refusing to start");
        return Err(err.into());
    }

    let engine = EngineScript {
        version: if args.tls13 { TlsVersion::Tls13 } else { TlsVersion::Tls12 },
        server_flights: flights(&args.server_flights, 0x16),
        finish_after: args.client_flights.len(),
        ..EngineScript::default()
    };
    let peer = PeerScript {
        client_flights: flights(&args.client_flights, 0x17),
        mtu: args.peer_mtu,
        irregular: args.irregular,
        ..PeerScript::default()
    };

    let world = Simulation::new(config, args.seed).engine(engine).peer(peer).run()?;

    info!(
        outcome = ?world.final_code(),
        rounds = world.rounds(),
        server_fragments = world.server_fragments(),
        server_acks = world.server_acks(),
        keys = world.keys().is_some(),
        "simulation complete"
    );
    Ok(())
}
