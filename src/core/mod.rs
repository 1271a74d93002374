//! Core module - platform-independent types and logic

pub mod display;
pub mod error;
pub mod format;
pub mod map_utils;
pub mod session;
pub mod state_channel;
pub mod traits;
pub mod types;

pub use display::{DisplayState, Region};
pub use error::{FetchError, SinkError};
pub use format::{format_delta, format_time};
pub use map_utils::is_kz_map;
pub use session::{fetch_records, RefreshSession, TickAction};
pub use state_channel::GameStateChannel;
pub use traits::{DisplaySink, RecordsSource};
pub use types::{GameState, Mode, PlayerId, Record, RecordPair, RecordsQuery, Tier};
