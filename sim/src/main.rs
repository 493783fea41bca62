//! Route letters through a network of post offices, one tick at a time.
//!
//! # Usage
//!
//! ```sh
//! cargo run --release --bin postal-sim -- --topology offices.txt --letters letters.yaml --ledger ledger.tsv
//! ```
//!
//! `offices.txt` lists one link per line (`1 2` connects office 1 and office 2). `letters.yaml`
//! schedules operator actions (see [manifest]): offices to add or remove, letters to submit,
//! letters to take and letters to give up on. Every state change is
//! appended to the audit log (`--log`), the final ledger is written as TSV to `--ledger` (or
//! stdout), and collected metrics are printed once the run completes.

mod manifest;
mod simulation;

use clap::{value_parser, Arg, ArgAction, Command};
use manifest::Manifest;
use postal_network::{audit, topology::Topology, Config, Network};
use prometheus_client::{encoding::text::encode, registry::Registry};
use std::{fs, fs::File, io, path::PathBuf, process::ExitCode};
use thiserror::Error;
use tracing::{error, info, Level};

/// Errors that abort a run.
#[derive(Error, Debug)]
enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),
    #[error("network error: {0}")]
    Network(#[from] postal_network::Error),
    #[error("failed to encode metrics")]
    Metrics,
}

fn main() -> ExitCode {
    // Parse arguments
    let matches = Command::new("postal-sim")
        .about("route letters through a network of post offices")
        .arg(
            Arg::new("topology")
                .long("topology")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Edge list of office links, one pair per line"),
        )
        .arg(
            Arg::new("letters")
                .long("letters")
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("YAML manifest of scheduled letters and operator actions"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .default_value("5")
                .value_parser(value_parser!(usize))
                .help("Letters each office can hold"),
        )
        .arg(
            Arg::new("ticks")
                .long("ticks")
                .default_value("100")
                .value_parser(value_parser!(u64))
                .help("Maximum number of ticks to run"),
        )
        .arg(
            Arg::new("max-moves")
                .long("max-moves")
                .default_value("2")
                .value_parser(value_parser!(usize))
                .help("Letters delivered or forwarded per tick"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .default_value("post_system.log")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ledger")
                .long("ledger")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("report-every")
                .long("report-every")
                .default_value("5")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &clap::ArgMatches) -> Result<(), Error> {
    // Load inputs
    let topology_path = matches
        .get_one::<PathBuf>("topology")
        .ok_or(postal_network::Error::InvalidParameter("missing topology"))?;
    let topology = Topology::parse(&fs::read_to_string(topology_path)?)?;
    info!(path = ?topology_path, offices = topology.len(), "loaded topology");
    let manifest = match matches.get_one::<PathBuf>("letters") {
        Some(path) => {
            let manifest: Manifest = serde_yaml::from_str(&fs::read_to_string(path)?)?;
            info!(
                ?path,
                letters = manifest.letters.len(),
                offices = manifest.offices.len(),
                removals = manifest.removals.len(),
                takes = manifest.takes.len(),
                undeliverable = manifest.undeliverable.len(),
                "loaded manifest"
            );
            manifest
        }
        None => Manifest::default(),
    };

    // Build network
    let cfg = Config {
        max_moves_per_tick: matches.get_one::<usize>("max-moves").copied().unwrap_or(2),
        ..Config::default()
    };
    let log = matches
        .get_one::<PathBuf>("log")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("post_system.log"));
    let sink = audit::Writer::new(File::create(&log)?);
    let mut network = Network::new(cfg, sink)?;
    let mut registry = Registry::default();
    network.register(&mut registry);
    let capacity = matches.get_one::<usize>("capacity").copied().unwrap_or(5);
    topology.apply(&mut network, capacity)?;

    // Process
    let max_ticks = matches.get_one::<u64>("ticks").copied().unwrap_or(100);
    let report_every = matches.get_one::<u64>("report-every").copied().unwrap_or(5);
    let summary = simulation::run(&mut network, &manifest, max_ticks, report_every)?;
    if summary.rejected > 0 {
        info!(rejected = summary.rejected, "some scheduled letters were rejected");
    }
    if summary.exhausted {
        info!(ticks = summary.ticks, "tick budget exhausted with letters in transit");
    }

    // Report
    print!("{}", network.status());
    let ledger = network.ledger().to_string();
    match matches.get_one::<PathBuf>("ledger") {
        Some(path) => {
            fs::write(path, ledger)?;
            info!(?path, "wrote ledger");
        }
        None => print!("{ledger}"),
    }
    let mut metrics = String::new();
    encode(&mut metrics, &registry).map_err(|_| Error::Metrics)?;
    print!("{metrics}");

    network.close();
    info!(path = ?log, "wrote audit log");
    Ok(())
}
