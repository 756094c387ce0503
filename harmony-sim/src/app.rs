//! Application orchestration for the Harmony simulator
//!
//! Wires configuration, both gloves, the broadcaster and the WebSocket server,
//! then runs the fixed-rate tick loop on the calling thread until the shared
//! running flag is cleared.

use crate::config::AppConfig;
use crate::core::types::Device;
use crate::devices::GloveSimulator;
use crate::error::{Error, Result};
use crate::gesture::GestureState;
use crate::streaming::{BroadcastStats, FrameBroadcaster, SinkRegistry, WsServer};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Main application structure that owns all components
pub struct HarmonyApp {
    config: AppConfig,
    broadcaster: FrameBroadcaster,
    server: WsServer,
    gestures: Arc<GestureState>,
    running: Arc<AtomicBool>,
}

impl HarmonyApp {
    /// Validate the configuration, build the simulation and start listening
    pub fn new(config: AppConfig, running: Arc<AtomicBool>) -> Result<Self> {
        config.validate()?;

        let table = config.gesture_table()?;
        let initial = table.lookup(&config.simulation.initial_gesture).ok_or_else(|| {
            Error::Config(format!(
                "unknown initial_gesture '{}'",
                config.simulation.initial_gesture
            ))
        })?;
        let gestures = Arc::new(GestureState::new(table, initial));

        let rates = config.simulation.motion_rates();
        let sim = &config.simulation;
        let left = GloveSimulator::new(Device::Left.wire_name(), sim.left_seed, rates);
        let right = GloveSimulator::new(Device::Right.wire_name(), sim.right_seed, rates);

        let registry = SinkRegistry::new();
        let server = WsServer::bind(
            &config.network.socket_address(),
            registry.clone(),
            Arc::clone(&gestures),
            Arc::clone(&running),
        )?;

        let broadcaster = FrameBroadcaster::new(
            config.streaming.wire_format,
            left,
            right,
            Arc::clone(&gestures),
            registry,
        )
        .with_summary_interval(config.streaming.summary_interval());

        Ok(Self {
            config,
            broadcaster,
            server,
            gestures,
            running,
        })
    }

    /// Address the WebSocket server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn stats(&self) -> BroadcastStats {
        self.broadcaster.stats()
    }

    /// Run the tick loop until the running flag is cleared
    pub fn run(&mut self) -> Result<()> {
        let interval = self.config.streaming.tick_interval();
        let dt = interval.as_secs_f64();

        self.log_banner();

        let mut next_tick = Instant::now() + interval;
        while self.running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            }

            if let Err(e) = self.broadcaster.tick(dt) {
                warn!("Tick failed: {}", e);
            }

            next_tick += interval;
            let now = Instant::now();
            if now > next_tick + interval {
                debug!(
                    "Tick loop behind by {:?}, skipping ahead",
                    now.saturating_duration_since(next_tick)
                );
                next_tick = now + interval;
            }
        }

        let stats = self.broadcaster.stats();
        info!(
            "Stopped after {} ticks ({} frames, {} messages, {} bytes, {} sinks dropped)",
            stats.ticks, stats.frames, stats.messages, stats.bytes, stats.dropped
        );
        Ok(())
    }

    fn log_banner(&self) {
        info!(
            "Harmony glove simulator | mode: {} | rate: {} Hz | ws://{}",
            self.config.streaming.wire_format,
            self.config.streaming.rate_hz,
            self.server.local_addr()
        );
        info!("Presets (send the name as a text message):");
        for gesture in self.gestures.table().iter() {
            info!("  {:12} {}", gesture.name(), gesture.description());
        }
        info!("Active gesture: {}", self.gestures.current().name());
    }
}
