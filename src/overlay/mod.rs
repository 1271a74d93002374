//! Overlay module - runtime pieces around the core logic
//!
//! This module contains the I/O side of the overlay:
//! - Configuration loading
//! - Logging setup
//! - Game state feed transports (WebSocket push, HTTP pull)
//! - HTTP records client
//! - Display sinks
//! - Refresh loop

pub mod config;
pub mod feed;
pub mod logging;
pub mod poll;
pub mod records;
pub mod refresh;
pub mod sink;
pub mod websocket;

pub use config::Config;
pub use feed::FeedHandle;
pub use records::HttpRecordsClient;
pub use refresh::RefreshLoop;
