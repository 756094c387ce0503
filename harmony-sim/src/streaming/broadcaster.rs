//! Tick-driven fan-out of glove readings to every connected sink
//!
//! # Per-tick flow
//!
//! ```text
//! tick(dt):
//! 1. Advance both gloves with the active gesture
//! 2. No sinks → reset the encoder once, deliver nothing
//! 3. JSON   → one snapshot, same text to every sink
//!    Binary → delta frame if any sink is Streaming
//!             full frame  if any sink is NeedsFull
//! 4. Deliver; a failing sink is dropped, the rest still receive
//! ```
//!
//! # Full frames and late joiners
//!
//! All sinks share one [`DeltaEncoder`]. A sink whose decoder is in sync
//! (`Streaming`) only ever receives delta frames, so it never has to tell a
//! full frame from a delta frame where all 28 sensors moved. A sink that just
//! connected or asked for `resync` (`NeedsFull`) receives its own full frame
//! built from the same readings, stamped with the same timestamp, and streams
//! deltas from the next tick on.
//!
//! The delta is encoded first; the full encode that follows re-records the
//! same pair, so the encoder history is identical whichever frames were built.

use crate::codec::DeltaEncoder;
use crate::core::types::GlovePair;
use crate::devices::GloveSimulator;
use crate::error::Result;
use crate::gesture::GestureState;
use crate::streaming::messages::Snapshot;
use crate::streaming::sink::{SinkRegistry, SinkState};
use crate::streaming::wire::{Outbound, WireFormat};
use log::{debug, info, trace};
use std::sync::Arc;

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Readings produced this tick
    pub pair: GlovePair,
    /// Sinks still registered after delivery
    pub sinks: usize,
    /// Messages queued successfully
    pub delivered: usize,
    /// Sinks dropped because delivery failed
    pub dropped: usize,
    /// Payload bytes queued
    pub bytes: usize,
    /// Full frames among the delivered messages (binary only)
    pub full_frames: usize,
}

/// Running totals since start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    pub ticks: u64,
    /// Ticks with at least one sink
    pub frames: u64,
    pub messages: u64,
    pub bytes: u64,
    pub dropped: u64,
}

/// Owns the simulation step and the full/delta decision per sink
pub struct FrameBroadcaster {
    format: WireFormat,
    left: GloveSimulator,
    right: GloveSimulator,
    gestures: Arc<GestureState>,
    registry: SinkRegistry,
    encoder: DeltaEncoder,
    /// Log a summary every this many frames (0 disables)
    summary_every: u64,
    stats: BroadcastStats,
}

impl FrameBroadcaster {
    pub fn new(
        format: WireFormat,
        left: GloveSimulator,
        right: GloveSimulator,
        gestures: Arc<GestureState>,
        registry: SinkRegistry,
    ) -> Self {
        Self {
            format,
            left,
            right,
            gestures,
            registry,
            encoder: DeltaEncoder::new(),
            summary_every: 0,
            stats: BroadcastStats::default(),
        }
    }

    /// Log a one-line summary every `frames` broadcast frames
    pub fn with_summary_interval(mut self, frames: u64) -> Self {
        self.summary_every = frames;
        self
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    pub fn encoder(&self) -> &DeltaEncoder {
        &self.encoder
    }

    pub fn stats(&self) -> BroadcastStats {
        self.stats
    }

    /// Advance the simulation by `dt` seconds and deliver to every sink
    pub fn tick(&mut self, dt: f64) -> Result<TickReport> {
        let motion = self.gestures.current().motion();
        let pair = GlovePair::new(
            self.left.advance(dt, Some(motion)),
            self.right.advance(dt, Some(motion)),
        );
        self.stats.ticks += 1;

        let mut report = TickReport {
            pair,
            ..TickReport::default()
        };

        let mut sinks = self.registry.lock();
        if sinks.is_empty() {
            if !self.encoder.is_unset() {
                self.encoder.reset();
                debug!("No sinks left, encoder reset");
            }
            return Ok(report);
        }

        let (streaming_msg, full_msg) = match self.format {
            WireFormat::Json => {
                let text = serde_json::to_string(&Snapshot::from_pair(&pair))?;
                let message = Outbound::Text(text);
                (Some(message.clone()), Some(message))
            }
            WireFormat::Binary => {
                if self.encoder.is_unset() {
                    for entry in sinks.iter_mut() {
                        entry.state = SinkState::NeedsFull;
                    }
                }
                let wants_delta = sinks.iter().any(|e| e.state == SinkState::Streaming);
                let wants_full = sinks.iter().any(|e| e.state == SinkState::NeedsFull);

                let timestamp_ms = self.encoder.timestamp_ms();
                let delta = wants_delta.then(|| {
                    let frame = self.encoder.encode_at(timestamp_ms, &pair, false);
                    trace!(
                        "Delta frame: mask={:#010x} len={}",
                        frame.mask,
                        frame.encoded_len()
                    );
                    Outbound::Binary(frame.to_bytes())
                });
                let full = wants_full.then(|| {
                    let frame = self.encoder.encode_at(timestamp_ms, &pair, true);
                    Outbound::Binary(frame.to_bytes())
                });
                (delta, full)
            }
        };

        sinks.retain_mut(|entry| {
            let message = match entry.state {
                SinkState::Streaming => streaming_msg.as_ref(),
                SinkState::NeedsFull => full_msg.as_ref(),
            };
            let Some(message) = message else {
                return true;
            };

            match entry.sink.deliver(message) {
                Ok(()) => {
                    if entry.state == SinkState::NeedsFull && self.format == WireFormat::Binary {
                        report.full_frames += 1;
                    }
                    entry.state = SinkState::Streaming;
                    report.delivered += 1;
                    report.bytes += message.len();
                    true
                }
                Err(e) => {
                    debug!("Dropping sink {}: {}", entry.id, e);
                    report.dropped += 1;
                    false
                }
            }
        });
        report.sinks = sinks.len();
        drop(sinks);

        self.stats.frames += 1;
        self.stats.messages += report.delivered as u64;
        self.stats.bytes += report.bytes as u64;
        self.stats.dropped += report.dropped as u64;

        if self.summary_every > 0 && self.stats.frames % self.summary_every == 0 {
            let flex = pair.left.flex();
            info!(
                "[frame {:6}] Flex L: [{:4} {:4} {:4} {:4} {:4}] | Gesture: {} | Clients: {}",
                self.stats.frames,
                flex[0],
                flex[1],
                flex[2],
                flex[3],
                flex[4],
                self.gestures.current().name(),
                report.sinks
            );
        }

        Ok(report)
    }
}
