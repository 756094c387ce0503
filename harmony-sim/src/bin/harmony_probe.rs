//! Minimal Harmony viewer
//!
//! Connects to a running simulator, decodes what it streams and prints one
//! line per frame. In binary mode it keeps a [`DeltaDecoder`] in sync and
//! recovers from a bad frame by asking the server for a full frame: binary
//! messages are skipped until the `{"status":"resync"}` reply, and the frame
//! right after it is full.
//!
//! ```text
//! harmony-probe ws://127.0.0.1:81 --gesture wave --count 100
//! ```

use clap::Parser;
use harmony_sim::codec::{DeltaDecoder, Frame};
use harmony_sim::core::GlovePair;
use harmony_sim::error::{Error, Result};
use harmony_sim::streaming::{ResyncAck, Snapshot};
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

#[derive(Parser, Debug)]
#[command(name = "harmony-probe", version)]
#[command(about = "Connect to a Harmony simulator and print decoded frames")]
struct Args {
    /// Server URL
    #[arg(default_value = "ws://127.0.0.1:81")]
    url: String,

    /// Gesture to select after connecting
    #[arg(short, long)]
    gesture: Option<String>,

    /// Stop after this many frames (0 = run until the server closes)
    #[arg(short, long, default_value = "0")]
    count: u64,

    /// Print every n-th frame
    #[arg(long, default_value = "1")]
    every: u64,

    /// Ask for the preset list first
    #[arg(long)]
    list: bool,

    /// Request a resync every n binary frames (0 = only on errors)
    #[arg(long, default_value = "0")]
    resync_every: u64,
}

/// One successfully decoded binary message
struct Decoded {
    frame: Frame,
    pair: GlovePair,
    /// Applied to a fresh decoder, i.e. a full frame
    absolute: bool,
}

/// Binary stream state of the probe
struct BinaryView {
    decoder: DeltaDecoder,
    /// Resync requested, reply not seen yet
    awaiting_ack: bool,
}

impl BinaryView {
    fn new() -> Self {
        Self {
            decoder: DeltaDecoder::new(),
            awaiting_ack: false,
        }
    }

    /// Decode one binary message; `Ok(None)` while resynchronizing
    fn accept(
        &mut self,
        bytes: &[u8],
        socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    ) -> Result<Option<Decoded>> {
        if self.awaiting_ack {
            log::debug!("Skipping frame queued before the resync");
            return Ok(None);
        }

        let frame = match Frame::parse(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                self.resync(socket, &Error::MalformedFrame(e))?;
                return Ok(None);
            }
        };

        let absolute = self.decoder.is_unset();
        match self.decoder.apply(&frame) {
            Ok(pair) => Ok(Some(Decoded {
                frame,
                pair,
                absolute,
            })),
            Err(e) => {
                self.resync(socket, &Error::MalformedFrame(e))?;
                Ok(None)
            }
        }
    }

    fn resync(
        &mut self,
        socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
        cause: &Error,
    ) -> Result<()> {
        log::warn!("{}; requesting resync", cause);
        self.request(socket)
    }

    fn request(&mut self, socket: &mut WebSocket<MaybeTlsStream<TcpStream>>) -> Result<()> {
        if !self.awaiting_ack {
            self.awaiting_ack = true;
            socket.send(Message::Text("resync".to_string()))?;
        }
        Ok(())
    }

    /// The server has switched this viewer to full; the next frame is absolute
    fn acknowledged(&mut self) {
        self.decoder.reset();
        self.awaiting_ack = false;
    }
}

fn print_pair(label: &str, pair: &GlovePair) {
    println!(
        "{} | L flex {:?} ypr {:?} | R flex {:?} ypr {:?}",
        label,
        pair.left.flex(),
        pair.left.ypr(),
        pair.right.flex(),
        pair.right.ypr()
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (mut socket, _response) = tungstenite::connect(args.url.as_str())?;
    log::info!("Connected to {}", args.url);

    if args.list {
        socket.send(Message::Text("list".to_string()))?;
    }
    if let Some(gesture) = &args.gesture {
        socket.send(Message::Text(gesture.clone()))?;
    }

    let mut view = BinaryView::new();
    let mut frames = 0u64;
    let every = args.every.max(1);

    loop {
        let message = match socket.read() {
            Ok(message) => message,
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                log::info!("Server closed the connection");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match message {
            Message::Binary(bytes) => {
                let Some(Decoded {
                    frame,
                    pair,
                    absolute,
                }) = view.accept(&bytes, &mut socket)?
                else {
                    continue;
                };
                frames += 1;
                if args.resync_every > 0 && frames % args.resync_every == 0 {
                    view.request(&mut socket)?;
                }
                if frames % every == 0 {
                    let kind = if absolute { "full " } else { "delta" };
                    let label = format!(
                        "#{:<6} t={:>8}ms {} {:>2} values {:>2}B",
                        frames,
                        frame.timestamp_ms,
                        kind,
                        frame.values.len(),
                        frame.encoded_len()
                    );
                    print_pair(&label, &pair);
                }
            }
            Message::Text(text) => {
                if let Ok(snapshot) = serde_json::from_str::<Snapshot>(&text) {
                    frames += 1;
                    if frames % every == 0 {
                        println!(
                            "#{:<6} L flex {:?} | R flex {:?}",
                            frames, snapshot.esp1.flex, snapshot.esp2.flex
                        );
                    }
                } else if serde_json::from_str::<ResyncAck>(&text)
                    .is_ok_and(|ack| ack.status == ResyncAck::STATUS)
                {
                    log::info!("Resync acknowledged");
                    view.acknowledged();
                } else {
                    println!("reply: {}", text);
                }
            }
            Message::Close(_) => {
                log::info!("Server is closing the connection");
            }
            _ => {}
        }

        if args.count > 0 && frames >= args.count {
            socket.close(None)?;
            let _ = socket.flush();
            break;
        }
    }

    log::info!("Received {} frames", frames);
    Ok(())
}
