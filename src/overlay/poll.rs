//! Pull game state feed
//!
//! Polls an HTTP endpoint that returns the current game state snapshot.
//! A non-success status means "no game state available right now"; the
//! previous snapshot stays in effect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::core::GameStateChannel;

use super::websocket::sleep_unless_shutdown;

/// Fetch the current snapshot once and hand it to the channel.
///
/// Returns true if the snapshot changed.
pub fn poll_once(client: &Client, url: &str, channel: &GameStateChannel) -> bool {
    let response = match client.get(url).send() {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "[FEED] Poll failed");
            return false;
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(status = status.as_u16(), "[FEED] Game state unavailable");
        return false;
    }

    match response.text() {
        Ok(body) => channel.ingest_json(&body),
        Err(e) => {
            warn!(error = %e, "[FEED] Failed to read game state body");
            false
        }
    }
}

/// Poll `url` every `interval` until shutdown.
pub fn run(
    url: String,
    interval: Duration,
    channel: GameStateChannel,
    shutdown_flag: Arc<AtomicBool>,
) {
    let client = match Client::builder().timeout(interval).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "[FEED] Failed to create HTTP client, feed disabled");
            return;
        }
    };

    info!(url = %url, interval_ms = interval.as_millis() as u64, "[FEED] Polling");

    while !shutdown_flag.load(Ordering::SeqCst) {
        poll_once(&client, &url, &channel);
        sleep_unless_shutdown(interval, &shutdown_flag);
    }

    info!("[FEED] Stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/state", listener.local_addr().unwrap());
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        url
    }

    #[test]
    fn test_poll_once_keeps_snapshot_when_unavailable() {
        let url = serve(vec![
            ("200 OK", r#"{"map_name": "kz_a", "mode": "kz_vanilla"}"#),
            ("503 Service Unavailable", ""),
            ("200 OK", "not json"),
        ]);
        let client = Client::new();
        let channel = GameStateChannel::new();

        assert!(poll_once(&client, &url, &channel));
        assert!(!poll_once(&client, &url, &channel));
        assert!(!poll_once(&client, &url, &channel));

        let state = channel.current().unwrap();
        assert_eq!(state.map_name.as_deref(), Some("kz_a"));
        assert_eq!(channel.revision(), 1);
    }
}
