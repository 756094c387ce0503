//! Configuration for the Harmony simulator
//!
//! Loads configuration from an optional TOML file. Every field has a default,
//! so an empty file (or no file) runs the stock simulator; command-line flags
//! override the file.
//!
//! ```toml
//! [network]
//! bind_address = "0.0.0.0"
//! port = 81
//!
//! [streaming]
//! wire_format = "binary"
//! rate_hz = 30
//!
//! [simulation]
//! left_seed = 42
//! right_seed = 99
//! initial_gesture = "repos"
//!
//! [[gestures]]
//! name = "rock"
//! description = "Index and little finger up"
//! flex_targets = [3500, 500, 3500, 3500, 500]
//! ```

use crate::devices::MotionRates;
use crate::error::{Error, Result};
use crate::gesture::{CustomGesture, GestureMotion, GestureTable};
use crate::streaming::WireFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Highest accepted streaming rate
pub const MAX_RATE_HZ: u32 = 1000;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extra presets appended after the built-in ones
    #[serde(default)]
    pub gestures: Vec<CustomGestureConfig>,
}

/// WebSocket listener
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Interface to bind (e.g. `0.0.0.0`, `127.0.0.1`)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port; 0 picks a free one
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    81
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl NetworkConfig {
    /// `host:port`, bracketing IPv6 literals
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

/// Output format and tick rate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    #[serde(default)]
    pub wire_format: WireFormat,
    /// Ticks (and frames) per second
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

fn default_rate_hz() -> u32 {
    30
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            wire_format: WireFormat::default(),
            rate_hz: default_rate_hz(),
        }
    }
}

impl StreamingConfig {
    /// Simulation step and send period
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }

    /// Frames between two summary log lines (five seconds' worth)
    pub fn summary_interval(&self) -> u64 {
        u64::from(self.rate_hz) * 5
    }
}

/// Glove simulation parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Seed of the left glove (`esp1`)
    #[serde(default = "default_left_seed")]
    pub left_seed: u64,
    /// Seed of the right glove (`esp2`)
    #[serde(default = "default_right_seed")]
    pub right_seed: u64,
    /// Convergence rate toward hold targets (1/s)
    #[serde(default = "default_hold_rate")]
    pub hold_rate: f64,
    /// Convergence rate toward the wave target (1/s)
    #[serde(default = "default_wave_rate")]
    pub wave_rate: f64,
    /// Preset active at startup
    #[serde(default = "default_initial_gesture")]
    pub initial_gesture: String,
}

fn default_left_seed() -> u64 {
    42
}

fn default_right_seed() -> u64 {
    99
}

fn default_hold_rate() -> f64 {
    3.0
}

fn default_wave_rate() -> f64 {
    5.0
}

fn default_initial_gesture() -> String {
    "repos".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            left_seed: default_left_seed(),
            right_seed: default_right_seed(),
            hold_rate: default_hold_rate(),
            wave_rate: default_wave_rate(),
            initial_gesture: default_initial_gesture(),
        }
    }
}

impl SimulationConfig {
    pub fn motion_rates(&self) -> MotionRates {
        MotionRates {
            hold: self.hold_rate,
            wave: self.wave_rate,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error, off); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A preset defined in the configuration file
///
/// Exactly one of `flex_targets` and `dynamic` must be given.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CustomGestureConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Hold targets, thumb first, each in 0..=4095
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_targets: Option<[u16; 5]>,
    /// Animate like the built-in wave
    #[serde(default)]
    pub dynamic: bool,
}

impl CustomGestureConfig {
    fn to_gesture(&self) -> Result<CustomGesture> {
        let motion = match (self.flex_targets, self.dynamic) {
            (Some(targets), false) => GestureMotion::Hold(targets.map(f64::from)),
            (None, true) => GestureMotion::Wave,
            (Some(_), true) => {
                return Err(Error::Config(format!(
                    "gesture '{}' sets both flex_targets and dynamic",
                    self.name
                )));
            }
            (None, false) => {
                return Err(Error::Config(format!(
                    "gesture '{}' needs flex_targets or dynamic = true",
                    self.name
                )));
            }
        };

        Ok(CustomGesture {
            name: self.name.clone(),
            description: self.description.clone(),
            motion,
        })
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub wire_format: Option<WireFormat>,
    pub rate_hz: Option<u32>,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// File contents when a path is given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.host {
            self.network.bind_address = host;
        }
        if let Some(port) = overrides.port {
            self.network.port = port;
        }
        if let Some(format) = overrides.wire_format {
            self.streaming.wire_format = format;
        }
        if let Some(rate) = overrides.rate_hz {
            self.streaming.rate_hz = rate;
        }
    }

    /// Built-in presets plus the validated custom ones
    pub fn gesture_table(&self) -> Result<GestureTable> {
        let custom = self
            .gestures
            .iter()
            .map(CustomGestureConfig::to_gesture)
            .collect::<Result<Vec<_>>>()?;
        GestureTable::with_custom(custom)
    }

    /// Check everything that could otherwise fail after startup
    pub fn validate(&self) -> Result<()> {
        if self.network.bind_address.trim().is_empty() {
            return Err(Error::Config("bind_address must not be empty".to_string()));
        }

        let rate = self.streaming.rate_hz;
        if rate == 0 || rate > MAX_RATE_HZ {
            return Err(Error::Config(format!(
                "rate_hz must be in 1..={}, got {}",
                MAX_RATE_HZ, rate
            )));
        }

        for (name, value) in [
            ("hold_rate", self.simulation.hold_rate),
            ("wave_rate", self.simulation.wave_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let table = self.gesture_table()?;
        if table.lookup(&self.simulation.initial_gesture).is_none() {
            return Err(Error::Config(format!(
                "unknown initial_gesture '{}' (available: {})",
                self.simulation.initial_gesture,
                table.names().join(", ")
            )));
        }

        log::LevelFilter::from_str(&self.logging.level).map_err(|_| {
            Error::Config(format!("unknown log level '{}'", self.logging.level))
        })?;

        Ok(())
    }
}
