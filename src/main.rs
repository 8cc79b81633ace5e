//! extreg host: drives the module registry through a full process lifecycle.
//!
//! Loads configured native modules, restores persisted profiles, initializes
//! modules, services a number of requests on a worker thread, persists
//! profiles and shuts everything down in reverse dependency order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use extreg_core::config::HostConfig;
use extreg_core::error::RegistryError;
use extreg_registry::{Registry, SystemState};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "extreg-host", version, about = "Load and drive extreg native modules")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "EXTREG_CONFIG")]
    config: Option<PathBuf>,

    /// Initialize modules for a CLI client instead of a server.
    #[arg(long)]
    cli: bool,

    /// Restore module profiles from this file before init.
    #[arg(long)]
    profile_in: Option<PathBuf>,

    /// Persist module profiles to this file before shutdown.
    #[arg(long)]
    profile_out: Option<PathBuf>,

    /// Number of request cycles to run on the worker thread.
    #[arg(long, default_value_t = 0)]
    requests: u64,
}

fn main() {
    let cli = Cli::parse();

    let config = match HostConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(&cli, &config) {
        tracing::error!("Module registry failure: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &HostConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Runs one full registry lifecycle.
fn run(cli: &Cli, config: &HostConfig) -> Result<(), RegistryError> {
    tracing::info!("Starting extreg host v{}", env!("CARGO_PKG_VERSION"));

    let system = Arc::new(SystemState::new());
    system.set_initialized(true);

    let mut registry =
        Registry::new(Arc::clone(&system)).with_tie_break(config.extensions.tie_break);

    // ── Step 1: Load modules ─────────────────────────────────────
    registry.module_load(&config.extensions)?;
    tracing::info!(
        modules = ?registry.ordered_names(),
        "Modules loaded in dependency order"
    );

    // ── Step 2: Restore profiles ─────────────────────────────────
    if let Some(path) = &cli.profile_in {
        let mut reader = BufReader::new(File::open(path)?);
        let restored = registry.deserialize_profiles(&mut reader)?;
        tracing::info!(path = %path.display(), restored, "Module profiles restored");
    }

    // ── Step 3: Initialize ───────────────────────────────────────
    if cli.cli {
        registry.cli_init()?;
    } else {
        registry.init()?;
    }

    // ── Step 4: Serve requests on a worker thread ────────────────
    let worker = registry.worker()?;
    let requests = cli.requests;
    std::thread::Builder::new()
        .name("extreg-worker".to_string())
        .spawn(move || {
            worker.thread_start();
            for _ in 0..requests {
                worker.request_start();
                worker.request_stop();
            }
            worker.thread_stop();
        })?
        .join()
        .map_err(|_| RegistryError::hook("Worker thread panicked"))?;
    tracing::info!(requests, "Worker thread finished");

    // ── Step 5: Persist profiles ─────────────────────────────────
    if let Some(path) = &cli.profile_out {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = registry.serialize_profiles(&mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), written, "Module profiles persisted");
    }

    // ── Step 6: Shutdown ─────────────────────────────────────────
    registry.shutdown();
    tracing::info!("extreg host stopped");
    Ok(())
}
