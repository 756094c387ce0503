//! WebSocket server for glove viewers
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Accept thread polls a non-blocking listener
//! 2. Each accepted socket gets its own connection thread
//! 3. WebSocket handshake (blocking, bounded by a timeout)
//! 4. A ChannelSink is registered; the viewer starts in NeedsFull
//! 5. Loop: drain queued frames to the socket, then read control text
//!    (replies are written right away, ahead of frames queued later)
//! 6. On close, error or shutdown the sink is unregistered
//! ```
//!
//! Reads use a short timeout so queued frames go out promptly and the
//! shared running flag is checked between polls.

use crate::error::{Error, Result};
use crate::gesture::GestureState;
use crate::streaming::control::ControlHandler;
use crate::streaming::sink::{ChannelSink, SinkRegistry};
use crate::streaming::wire::Outbound;
use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, WebSocket};

/// Idle sleep of the accept loop
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Read timeout of a connection; bounds outbound latency
const READ_POLL: Duration = Duration::from_millis(5);

/// Upper bound for the opening handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts viewers and runs one thread per connection
pub struct WsServer {
    local_addr: SocketAddr,
    accept_thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl WsServer {
    /// Bind and start accepting in the background
    ///
    /// The server stops when `running` is cleared.
    pub fn bind(
        address: &str,
        registry: SinkRegistry,
        gestures: Arc<GestureState>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", address, e)))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let accept_running = Arc::clone(&running);
        let accept_thread = thread::Builder::new()
            .name("ws-accept".to_string())
            .spawn(move || accept_loop(listener, registry, gestures, accept_running))?;

        info!("WebSocket server listening on ws://{}", local_addr);

        Ok(Self {
            local_addr,
            accept_thread: Some(accept_thread),
            running,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Clear the running flag; connection threads exit on their next poll
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self.stop();

        if let Some(thread) = self.accept_thread.take() {
            let _ = thread.join();
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    registry: SinkRegistry,
    gestures: Arc<GestureState>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let registry = registry.clone();
                let gestures = Arc::clone(&gestures);
                let running = Arc::clone(&running);
                let spawned = thread::Builder::new()
                    .name("ws-conn".to_string())
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, addr, registry, gestures, running)
                        {
                            warn!("Connection {} ended with error: {}", addr, e);
                        }
                    });
                if let Err(e) = spawned {
                    error!("Failed to spawn connection thread for {}: {}", addr, e);
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                error!("Accept error: {}", e);
            }
        }
    }
    debug!("Accept loop exiting");
}

fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: SinkRegistry,
    gestures: Arc<GestureState>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    let mut socket = tungstenite::accept(stream)
        .map_err(|e| Error::Other(format!("handshake with {} failed: {}", addr, e)))?;
    socket.get_ref().set_read_timeout(Some(READ_POLL))?;

    let (sink, outbound) = ChannelSink::pair();
    let id = registry.add(Box::new(sink));
    info!("Client connected: {} ({})", addr, id);

    let control = ControlHandler::new(gestures, registry.clone(), id, outbound.clone());
    let result = pump(&mut socket, &outbound, &control, &running);

    registry.remove(id);
    info!("Client disconnected: {} ({})", addr, id);

    if !running.load(Ordering::Relaxed) {
        let _ = socket.close(None);
        let _ = socket.flush();
    }
    result
}

/// Move queued frames out and control messages in until the viewer leaves
fn pump(
    socket: &mut WebSocket<TcpStream>,
    outbound: &Receiver<Outbound>,
    control: &ControlHandler,
    running: &AtomicBool,
) -> Result<()> {
    while running.load(Ordering::Relaxed) {
        loop {
            match outbound.try_recv() {
                Ok(message) => socket.write(message.into())?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Sink dropped by broadcaster");
                    return Ok(());
                }
            }
        }
        socket.flush()?;

        match socket.read() {
            Ok(Message::Text(text)) => match control.handle(&text) {
                Ok(Some(reply)) => socket.send(Message::Text(reply))?,
                Ok(None) => {}
                Err(e) => warn!("Failed to answer control message: {}", e),
            },
            Ok(Message::Close(_)) => {
                let _ = socket.flush();
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
