//! Game state feed transports
//!
//! Runs the configured transport on its own thread. The thread is the only
//! writer of the [`GameStateChannel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use crate::core::GameStateChannel;

use super::config::{FeedSettings, FeedTransport};
use super::{poll, websocket};

/// Handle to a running feed thread
pub struct FeedHandle {
    shutdown_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Start the configured transport.
    ///
    /// `interval` is the poll period of the pull transport.
    pub fn start(settings: &FeedSettings, interval: Duration, channel: GameStateChannel) -> Self {
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown_flag);
        let url = settings.url.clone();
        let transport = settings.transport;

        info!(transport = ?transport, "[FEED] Starting");

        let handle = thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match transport {
                FeedTransport::Push => websocket::run(url, channel, flag),
                FeedTransport::Pull => poll::run(url, interval, channel, flag),
            }));

            if let Err(panic_info) = result {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    format!("Feed thread panic: {}", s)
                } else {
                    "Feed thread panic".to_string()
                };
                error!("{}", msg);
            }
        });

        Self {
            shutdown_flag,
            thread_handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
