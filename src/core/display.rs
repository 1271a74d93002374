//! Display reconciliation
//!
//! Computes the text of every overlay region from the latest game state and
//! records. The whole [`DisplayState`] is rebuilt on every cycle so nothing
//! from a previous map can survive a map change.

use super::format::{format_delta, format_time};
use super::error::SinkError;
use super::traits::DisplaySink;
use super::types::{Category, GameState, RecordPair};

/// Text shown when no map name is known
pub const UNKNOWN_MAP: &str = "unknown map";
/// Text shown when a category has no world record
pub const NO_WR: &str = "no WR";

// =============================================================================
// REGIONS
// =============================================================================

/// Named overlay text region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    MapName,
    TpWr,
    ProWr,
    TpPb,
    ProPb,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::MapName,
        Region::TpWr,
        Region::ProWr,
        Region::TpPb,
        Region::ProPb,
    ];

    /// Stable name, also used as the file name by the file sink
    pub fn name(self) -> &'static str {
        match self {
            Region::MapName => "map_name",
            Region::TpWr => "tp_wr",
            Region::ProWr => "pro_wr",
            Region::TpPb => "tp_pb",
            Region::ProPb => "pro_pb",
        }
    }
}

// =============================================================================
// DISPLAY STATE
// =============================================================================

/// Text of every overlay region for one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub map_label: String,
    pub tp_wr: String,
    pub pro_wr: String,
    pub tp_pb: String,
    pub pro_pb: String,
}

impl DisplayState {
    /// Compute the display from the freshest snapshot and the latest records.
    pub fn reconcile(state: Option<&GameState>, wrs: &RecordPair, pbs: &RecordPair) -> Self {
        let (tp_wr, tp_pb) = category_lines(wrs, pbs, Category::Tp);
        let (pro_wr, pro_pb) = category_lines(wrs, pbs, Category::Pro);

        Self {
            map_label: map_label(state),
            tp_wr,
            pro_wr,
            tp_pb,
            pro_pb,
        }
    }

    pub fn region(&self, region: Region) -> &str {
        match region {
            Region::MapName => &self.map_label,
            Region::TpWr => &self.tp_wr,
            Region::ProWr => &self.pro_wr,
            Region::TpPb => &self.tp_pb,
            Region::ProPb => &self.pro_pb,
        }
    }

    /// Apply every region to the sink in one go
    pub fn commit<S: DisplaySink + ?Sized>(&self, sink: &mut S) -> Result<(), SinkError> {
        sink.commit(self)
    }
}

/// `[KZT] kz_map (T5)`, `kz_map (not global)`, ...
pub fn map_label(state: Option<&GameState>) -> String {
    let map_name = state
        .and_then(|s| s.map_name.as_deref())
        .unwrap_or(UNKNOWN_MAP);

    let mut label = match state.and_then(|s| s.mode.as_ref()) {
        Some(mode) => format!("[{}] {}", mode.short(), map_name),
        None => map_name.to_string(),
    };

    match state.and_then(|s| s.map_tier) {
        Some(tier) => label.push_str(&format!(" (T{})", u8::from(tier))),
        None => label.push_str(" (not global)"),
    }

    label
}

/// WR line and PB delta for one category
fn category_lines(wrs: &RecordPair, pbs: &RecordPair, category: Category) -> (String, String) {
    let Some(wr) = wrs.get(category) else {
        return (NO_WR.to_string(), String::new());
    };

    let wr_line = format!("{} by {}", format_time(wr.time), wr.player_name);
    let delta = pbs
        .get(category)
        .map(|pb| format_delta(pb.time, wr.time))
        .unwrap_or_default();

    (wr_line, delta)
}
