//! Harmony: simulated two-glove motion-capture streamer
//!
//! Two seeded glove simulators (`esp1` left, `esp2` right) produce 14 sensor
//! readings each per tick. A [`FrameBroadcaster`](streaming::FrameBroadcaster)
//! fans them out over WebSocket either as verbose JSON snapshots or as compact
//! delta-encoded binary frames ([`codec`]).
//!
//! ## Module Structure
//!
//! - [`core`]: sensor vector layout and device identities
//! - [`devices`]: glove simulators
//! - [`gesture`]: preset table and the active preset token
//! - [`codec`]: binary frame layout, delta encoder and decoder
//! - [`streaming`]: broadcaster, sinks, control channel, WebSocket server
//! - [`config`] / [`app`]: configuration and orchestration

pub mod app;
pub mod codec;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod gesture;
pub mod streaming;

pub use app::HarmonyApp;
pub use config::AppConfig;
pub use error::{Error, FrameError, Result};
