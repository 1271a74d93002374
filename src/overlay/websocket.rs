//! WebSocket client for the push game state feed
//!
//! Every text frame is a complete JSON game state snapshot. The client
//! reconnects with exponential backoff whenever the connection drops.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};

use crate::core::GameStateChannel;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
const READ_IDLE_SLEEP: Duration = Duration::from_millis(10);

// =============================================================================
// FEED THREAD
// =============================================================================

/// Connect to `url` and feed every snapshot into `channel` until shutdown.
pub fn run(url: String, channel: GameStateChannel, shutdown_flag: Arc<AtomicBool>) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY;

    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            break;
        }

        info!(url = %url, "[FEED] Connecting...");

        match connect(url.as_str()) {
            Ok((mut socket, _)) => {
                info!("[FEED] Connected");
                reconnect_delay = INITIAL_RECONNECT_DELAY;

                let result = message_loop(&mut socket, &channel, &shutdown_flag);
                if let Err(e) = &result {
                    info!(error = %e, "[FEED] Disconnected");
                }
                let _ = socket.close(None);
            }
            Err(e) => {
                error!(error = %e, "[FEED] Connection failed");
            }
        }

        if shutdown_flag.load(Ordering::SeqCst) {
            break;
        }

        info!(delay = reconnect_delay.as_secs(), "[FEED] Reconnecting...");
        sleep_unless_shutdown(reconnect_delay, &shutdown_flag);
        reconnect_delay = (reconnect_delay * 2).min(MAX_RECONNECT_DELAY);
    }

    info!("[FEED] Stopped");
}

fn message_loop(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    channel: &GameStateChannel,
    shutdown_flag: &AtomicBool,
) -> Result<(), String> {
    // Non-blocking so the shutdown flag is checked between frames
    match socket.get_ref() {
        MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_nonblocking(true);
        }
        MaybeTlsStream::NativeTls(tls) => {
            let _ = tls.get_ref().set_nonblocking(true);
        }
        _ => {}
    }

    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            return Ok(());
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                handle_frame(channel, &text);
            }
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_frame(channel, text),
                Err(e) => warn!(error = %e, "[FEED] Dropping non UTF-8 binary frame"),
            },
            Ok(Message::Close(_)) => return Err("Server closed".to_string()),
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(READ_IDLE_SLEEP);
            }
            Err(e) => return Err(format!("Read error: {}", e)),
        }
    }
}

fn handle_frame(channel: &GameStateChannel, payload: &str) {
    if channel.ingest_json(payload) {
        debug!(revision = channel.revision(), "[FEED] Snapshot received");
    }
}

/// Sleep for `delay`, waking early if shutdown is requested
pub(crate) fn sleep_unless_shutdown(delay: Duration, shutdown_flag: &AtomicBool) {
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;
    while slept < delay && !shutdown_flag.load(Ordering::SeqCst) {
        let chunk = step.min(delay - slept);
        thread::sleep(chunk);
        slept += chunk;
    }
}
