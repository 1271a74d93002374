//! Error types shared by the overlay components.

use thiserror::Error;

/// Failure of a single records lookup.
///
/// Never fatal: the refresh loop treats a failed lookup as "no record".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("records service returned status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Failure to write to a display sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write region `{region}`: {source}")]
    Write {
        region: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare output directory: {0}")]
    Directory(#[source] std::io::Error),
}
