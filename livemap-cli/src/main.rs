//! LiveMap CLI - scripted replay and inspection for the map engine.
//!
//! This binary drives the livemap engine over its bundled headless surface:
//! `replay` executes a scenario file step by step and prints the engine
//! events (and, on request, every surface operation) it produces; `catalog`
//! prints the basemap catalog the engine would run with.

mod commands;
mod error;

use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{catalog, replay};

#[derive(Debug, Parser)]
#[command(
    name = "livemap",
    version,
    about = "Headless replay and inspection tool for the livemap engine"
)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scenario against a headless engine session
    Replay(replay::ReplayArgs),

    /// Print the basemap catalog
    Catalog(catalog::CatalogArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Replay(args) => replay::run(args),
        Commands::Catalog(args) => catalog::run(args),
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so replay output on stdout stays pipeable; `RUST_LOG`
/// overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
