//! WebSocket streaming for Harmony
//!
//! - [`broadcaster`]: per-tick simulation step and fan-out
//! - [`sink`]: connected viewers and their full/delta state
//! - [`control`]: inbound text commands
//! - [`ws_server`]: accept loop and connection threads
//! - [`messages`] / [`wire`]: payload types and formats

pub mod broadcaster;
pub mod control;
pub mod messages;
pub mod sink;
pub mod wire;
pub mod ws_server;

pub use broadcaster::{BroadcastStats, FrameBroadcaster, TickReport};
pub use control::{ControlCommand, ControlHandler};
pub use messages::{GestureAck, PresetList, ResyncAck, Snapshot};
pub use sink::{ChannelSink, FrameSink, SinkId, SinkRegistry, SinkState};
pub use wire::{Outbound, WireFormat};
pub use ws_server::WsServer;
