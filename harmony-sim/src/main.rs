//! Harmony glove simulator daemon
//!
//! Streams two simulated sensor gloves to WebSocket viewers.
//!
//! ```text
//! harmony-sim                          # JSON on ws://0.0.0.0:81, 30 Hz
//! harmony-sim --mode binary --port 8081
//! harmony-sim --config harmony.toml --rate 60
//! harmony-sim --mode binary --save-config harmony.toml
//! ```

use clap::Parser;
use harmony_sim::config::{AppConfig, ConfigOverrides};
use harmony_sim::error::{Error, Result};
use harmony_sim::streaming::WireFormat;
use harmony_sim::HarmonyApp;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser, Debug)]
#[command(name = "harmony-sim", version)]
#[command(about = "Simulated two-glove motion-capture streamer over WebSocket")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (default 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// WebSocket port (default 81)
    #[arg(short, long)]
    port: Option<u16>,

    /// Streaming format (default json)
    #[arg(short, long, value_enum)]
    mode: Option<WireFormat>,

    /// Frames per second (default 30)
    #[arg(short, long)]
    rate: Option<u32>,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(ConfigOverrides {
        host: args.host,
        port: args.port,
        wire_format: args.mode,
        rate_hz: args.rate,
    });

    if let Some(path) = &args.save_config {
        config.validate()?;
        config.to_file(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    // RUST_LOG takes precedence over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("Harmony v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        log::info!("Using config: {}", path.display());
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut app = HarmonyApp::new(config, running)?;
    app.run()?;

    log::info!("Harmony stopped");
    Ok(())
}
