//! Connected viewers as seen by the broadcaster
//!
//! A sink accepts whole messages. The WebSocket server backs each viewer with
//! a [`ChannelSink`]: an unbounded crossbeam queue drained by that viewer's
//! connection thread, so delivery from the tick loop never blocks on a socket.
//!
//! The [`SinkRegistry`] is shared between the tick loop (delivery, dropping
//! dead sinks) and connection threads (add, remove, resync requests).

use crate::error::{Error, Result};
use crate::streaming::wire::Outbound;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Downstream consumer of broadcast messages
pub trait FrameSink: Send {
    /// Queue one whole message; an error means the sink is gone
    fn deliver(&mut self, message: &Outbound) -> Result<()>;
}

/// Sink backed by an unbounded channel
pub struct ChannelSink {
    sender: Sender<Outbound>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Outbound>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end its connection thread drains
    pub fn pair() -> (Self, Receiver<Outbound>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }
}

impl FrameSink for ChannelSink {
    fn deliver(&mut self, message: &Outbound) -> Result<()> {
        self.sender
            .send(message.clone())
            .map_err(|_| Error::SinkClosed)
    }
}

/// Registry-assigned sink identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl std::fmt::Display for SinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a sink stands in the binary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Next binary delivery must be a full frame
    NeedsFull,
    /// Decoder is in sync; delta frames apply
    Streaming,
}

/// One registered sink
pub struct SinkEntry {
    pub id: SinkId,
    pub state: SinkState,
    pub sink: Box<dyn FrameSink>,
}

/// Shared, mutex-guarded set of sinks
#[derive(Clone, Default)]
pub struct SinkRegistry {
    entries: Arc<Mutex<Vec<SinkEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink; it starts in [`SinkState::NeedsFull`]
    pub fn add(&self, sink: Box<dyn FrameSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(SinkEntry {
            id,
            state: SinkState::NeedsFull,
            sink,
        });
        id
    }

    /// Unregister a sink; false if it was already gone
    pub fn remove(&self, id: SinkId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Mark a sink so its next binary delivery is a full frame
    pub fn request_resync(&self, id: SinkId) -> bool {
        self.request_resync_with(id, || {})
    }

    /// Mark a sink as [`SinkState::NeedsFull`] and run `on_marked` before the
    /// lock is released
    ///
    /// No broadcast can interleave with `on_marked`, so anything it drains
    /// from the sink's queue predates the full frame.
    pub fn request_resync_with<F: FnOnce()>(&self, id: SinkId, on_marked: F) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.state = SinkState::NeedsFull;
                on_marked();
                true
            }
            None => false,
        }
    }

    pub fn state(&self, id: SinkId) -> Option<SinkState> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Exclusive access for one broadcast pass
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<SinkEntry>> {
        self.entries.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_and_detects_close() {
        let (mut sink, receiver) = ChannelSink::pair();
        sink.deliver(&Outbound::Text("a".into())).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), Outbound::Text("a".into()));

        drop(receiver);
        assert!(matches!(
            sink.deliver(&Outbound::Binary(vec![0])),
            Err(Error::SinkClosed)
        ));
    }

    #[test]
    fn test_registry_lifecycle() {
        let registry = SinkRegistry::new();
        let (a, _ra) = ChannelSink::pair();
        let (b, _rb) = ChannelSink::pair();
        let a = registry.add(Box::new(a));
        let b = registry.add(Box::new(b));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.state(a), Some(SinkState::NeedsFull));

        registry.lock()[0].state = SinkState::Streaming;
        assert!(registry.request_resync(a));
        assert_eq!(registry.state(a), Some(SinkState::NeedsFull));

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert!(!registry.request_resync(a));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(b));
        assert!(registry.is_empty());
    }
}
