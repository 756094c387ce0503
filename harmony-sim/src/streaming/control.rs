//! Text control channel
//!
//! Viewers steer the simulation with single-word text messages:
//!
//! | Message | Effect | Reply |
//! |---------|--------|-------|
//! | preset name | switch the active gesture | `{"status":"ok","gesture":..,"description":..}` |
//! | `list` | none | `{"presets":[..]}` in table order |
//! | `resync` | sender's next binary frame is full | `{"status":"resync"}` |
//! | anything else | none | none |
//!
//! Matching trims whitespace and ignores ASCII case.
//!
//! A viewer cannot tell a full frame from a delta frame in which every sensor
//! moved, so `resync` drops the frames still queued for that viewer and is
//! answered in order with the stream: the first binary message after the
//! `resync` reply is the full frame.

use crate::error::Result;
use crate::gesture::{GestureId, GestureState, GestureTable};
use crate::streaming::messages::{GestureAck, PresetList, ResyncAck};
use crate::streaming::sink::{SinkId, SinkRegistry};
use crate::streaming::wire::Outbound;
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// A parsed control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch to this preset
    Select(GestureId),
    /// List preset names
    List,
    /// Send the sender a full frame next
    Resync,
}

impl ControlCommand {
    /// Parse a text message; `None` for anything not understood
    pub fn parse(text: &str, table: &GestureTable) -> Option<Self> {
        let word = text.trim();
        if word.eq_ignore_ascii_case("list") {
            Some(ControlCommand::List)
        } else if word.eq_ignore_ascii_case("resync") {
            Some(ControlCommand::Resync)
        } else {
            table.lookup(word).map(ControlCommand::Select)
        }
    }
}

/// Applies control messages from one viewer
pub struct ControlHandler {
    gestures: Arc<GestureState>,
    registry: SinkRegistry,
    sink_id: SinkId,
    /// Queue of this viewer's sink, emptied on resync
    pending: Receiver<Outbound>,
}

impl ControlHandler {
    pub fn new(
        gestures: Arc<GestureState>,
        registry: SinkRegistry,
        sink_id: SinkId,
        pending: Receiver<Outbound>,
    ) -> Self {
        Self {
            gestures,
            registry,
            sink_id,
            pending,
        }
    }

    /// Handle one text message and return the reply to send back, if any
    pub fn handle(&self, text: &str) -> Result<Option<String>> {
        let Some(command) = ControlCommand::parse(text, self.gestures.table()) else {
            log::trace!("Ignoring control message from {}: {:?}", self.sink_id, text);
            return Ok(None);
        };

        match command {
            ControlCommand::Select(id) => {
                let gesture = self.gestures.select_id(id);
                log::info!("Gesture → {} (from {})", gesture.name(), self.sink_id);
                Ok(Some(serde_json::to_string(&GestureAck::ok(gesture))?))
            }
            ControlCommand::List => {
                let presets = self
                    .gestures
                    .table()
                    .names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                Ok(Some(serde_json::to_string(&PresetList { presets })?))
            }
            ControlCommand::Resync => {
                let mut discarded = 0;
                let marked = self.registry.request_resync_with(self.sink_id, || {
                    discarded = self.pending.try_iter().count();
                });
                if !marked {
                    return Ok(None);
                }
                log::debug!(
                    "Resync requested by {} ({} queued frames dropped)",
                    self.sink_id,
                    discarded
                );
                Ok(Some(serde_json::to_string(&ResyncAck::new())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{CustomGesture, Gesture, GestureMotion};
    use crate::streaming::sink::{ChannelSink, SinkState};

    fn handler() -> (ControlHandler, Arc<GestureState>, SinkRegistry, SinkId) {
        let (handler, gestures, registry, id, _) = handler_with_queue();
        (handler, gestures, registry, id)
    }

    fn handler_with_queue() -> (
        ControlHandler,
        Arc<GestureState>,
        SinkRegistry,
        SinkId,
        crossbeam_channel::Sender<Outbound>,
    ) {
        let table = GestureTable::with_custom(vec![CustomGesture {
            name: "rock".into(),
            description: "Index and little up".into(),
            motion: GestureMotion::Hold([3500.0, 500.0, 3500.0, 3500.0, 500.0]),
        }])
        .unwrap();
        let initial = table.lookup("repos").unwrap();
        let gestures = Arc::new(GestureState::new(table, initial));
        let registry = SinkRegistry::new();
        let (sender, pending) = crossbeam_channel::unbounded();
        let id = registry.add(Box::new(ChannelSink::new(sender.clone())));
        let handler = ControlHandler::new(Arc::clone(&gestures), registry.clone(), id, pending);
        (handler, gestures, registry, id, sender)
    }

    #[test]
    fn test_parse_trims_and_ignores_case() {
        let table = GestureTable::builtin();
        assert_eq!(
            ControlCommand::parse("  LiSt\n", &table),
            Some(ControlCommand::List)
        );
        assert_eq!(
            ControlCommand::parse("RESYNC", &table),
            Some(ControlCommand::Resync)
        );
        assert_eq!(
            ControlCommand::parse(" Poing ", &table),
            table.lookup("poing").map(ControlCommand::Select)
        );
        assert_eq!(ControlCommand::parse("jump", &table), None);
        assert_eq!(ControlCommand::parse("", &table), None);
    }

    #[test]
    fn test_select_replies_and_switches() {
        let (handler, gestures, _, _) = handler();
        let reply = handler.handle("WAVE").unwrap().unwrap();
        assert_eq!(
            reply,
            r#"{"status":"ok","gesture":"wave","description":"Animated wave (sinusoidal motion)"}"#
        );
        assert_eq!(gestures.current(), &Gesture::Wave);

        handler.handle("rock").unwrap().unwrap();
        assert_eq!(gestures.current().name(), "rock");
    }

    #[test]
    fn test_list_in_table_order() {
        let (handler, _, _, _) = handler();
        let reply = handler.handle("list").unwrap().unwrap();
        assert_eq!(
            reply,
            r#"{"presets":["repos","poing","pointer","peace","pouce","wave","rock"]}"#
        );
    }

    #[test]
    fn test_resync_marks_sink_and_drops_queue() {
        let (handler, _, registry, id, sender) = handler_with_queue();
        registry.lock()[0].state = SinkState::Streaming;
        sender.send(Outbound::Binary(vec![0; 8])).unwrap();
        sender.send(Outbound::Binary(vec![1; 8])).unwrap();

        let reply = handler.handle(" resync ").unwrap().unwrap();
        assert_eq!(reply, r#"{"status":"resync"}"#);
        assert_eq!(registry.state(id), Some(SinkState::NeedsFull));
        assert!(handler.pending.is_empty());
    }

    #[test]
    fn test_resync_after_removal_is_silent() {
        let (handler, _, registry, id) = handler();
        registry.remove(id);
        assert_eq!(handler.handle("resync").unwrap(), None);
    }

    #[test]
    fn test_unknown_is_ignored() {
        let (handler, gestures, _, _) = handler();
        assert_eq!(handler.handle("dance").unwrap(), None);
        assert_eq!(gestures.current(), &Gesture::Rest);
    }
}
