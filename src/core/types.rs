//! Core types - platform-independent data structures
//!
//! These types represent the game state snapshot received from the feed and
//! the records returned by the records service.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Deserializer, Serialize};

use super::map_utils::{is_kz_map, strip_workshop_path};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Player identifier (SteamID) as reported by the feed.
///
/// The feed may encode it either as a number (SteamID64) or as a string
/// (`STEAM_1:0:123`), so it is kept in its textual form and passed through
/// to the records service verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(id) => PlayerId::from(id),
            Raw::Text(id) => PlayerId(id),
        })
    }
}

// =============================================================================
// MODE
// =============================================================================

/// KZ game mode
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    KzTimer,
    SimpleKz,
    Vanilla,
    /// A mode string the overlay does not recognise, kept verbatim
    Unknown(String),
}

impl Mode {
    /// Identifier used by the records service (`kz_timer`, ...)
    pub fn api_name(&self) -> &str {
        match self {
            Mode::KzTimer => "kz_timer",
            Mode::SimpleKz => "kz_simple",
            Mode::Vanilla => "kz_vanilla",
            Mode::Unknown(raw) => raw,
        }
    }

    /// Abbreviation shown in the map label
    pub fn short(&self) -> &'static str {
        match self {
            Mode::KzTimer => "KZT",
            Mode::SimpleKz => "SKZ",
            Mode::Vanilla => "VNL",
            Mode::Unknown(_) => "unknown mode",
        }
    }

    /// Parse a mode from a player's clan tag (`[KZT 1234]`, `[SKZ]`).
    ///
    /// GOKZ writes the mode and, optionally, the player's rank into the clan tag.
    pub fn from_clan_tag(clan: &str) -> Option<Self> {
        let inner = clan.trim().trim_start_matches('[').trim_end_matches(']');
        let mode = inner.split_whitespace().next()?;
        match Mode::from(mode.to_string()) {
            Mode::Unknown(_) => None,
            mode => Some(mode),
        }
    }
}

impl From<String> for Mode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "kz_timer" | "KZT" | "kzt" | "200" => Mode::KzTimer,
            "kz_simple" | "SKZ" | "skz" | "201" => Mode::SimpleKz,
            "kz_vanilla" | "VNL" | "vnl" | "202" => Mode::Vanilla,
            _ => Mode::Unknown(raw),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Unknown(raw) => raw,
            known => known.api_name().to_string(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

// =============================================================================
// TIER
// =============================================================================

/// Map difficulty tier, assigned once a map is global
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[derive(Serialize)]
#[serde(into = "u8")]
#[repr(u8)]
pub enum Tier {
    VeryEasy = 1,
    Easy = 2,
    Medium = 3,
    Hard = 4,
    VeryHard = 5,
    Extreme = 6,
    Death = 7,
}

/// Tiers outside 1..=7 are treated as "not global" instead of rejecting the
/// whole snapshot.
fn lenient_tier<'de, D>(deserializer: D) -> Result<Option<Tier>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(tier_from_value))
}

/// Integral numbers (`5`, `5.0`) in 1..=7; anything else is no tier
fn tier_from_value(value: &serde_json::Value) -> Option<Tier> {
    let raw = match value.as_u64() {
        Some(raw) => raw,
        None => {
            let float = value.as_f64()?;
            if float.fract() != 0.0 || float < 0.0 {
                return None;
            }
            float as u64
        }
    };
    u8::try_from(raw).ok().and_then(|raw| Tier::try_from(raw).ok())
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Snapshot of the player's current context, as sent by the feed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub steam_id: Option<PlayerId>,
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_tier")]
    pub map_tier: Option<Tier>,
    #[serde(default)]
    pub mode: Option<Mode>,
    /// Player clan tag; GOKZ puts the mode there (`[KZT 1234]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clan: Option<String>,
}

impl GameState {
    /// Bring a raw feed snapshot into canonical form: workshop maps lose
    /// their `workshop/<id>/` prefix, and a missing mode is taken from the
    /// clan tag.
    pub fn normalize(mut self) -> Self {
        if let Some(map_name) = self.map_name.take() {
            self.map_name = Some(strip_workshop_path(&map_name).to_string());
        }
        if self.mode.is_none() {
            self.mode = self.clan.as_deref().and_then(Mode::from_clan_tag);
        }
        self
    }

    /// Build the records lookup for this snapshot.
    ///
    /// Returns None when the snapshot does not warrant a lookup: the player
    /// identifier or mode is missing, or the map is not a KZ map.
    pub fn records_query(&self) -> Option<RecordsQuery> {
        let steam_id = self.steam_id.clone()?;
        let mode = self.mode.clone()?;
        if !is_kz_map(self.map_name.as_deref()) {
            return None;
        }
        let map_name = self.map_name.clone()?;
        Some(RecordsQuery {
            steam_id,
            map_name,
            mode,
        })
    }
}

/// Parameters of a records lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordsQuery {
    pub steam_id: PlayerId,
    pub map_name: String,
    pub mode: Mode,
}

// =============================================================================
// RECORDS
// =============================================================================

/// A completed run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Run time in seconds
    pub time: f64,
    pub player_name: String,
    #[serde(default)]
    pub steam_id: Option<PlayerId>,
}

impl Record {
    pub fn new(time: f64, player_name: impl Into<String>) -> Self {
        Self {
            time,
            player_name: player_name.into(),
            steam_id: None,
        }
    }
}

/// Checkpoint-assisted (TP) and pro records for one map/mode
///
/// On the wire this is a two-element array `[tp, pro]` where either entry
/// may be `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Option<Record>, Option<Record>)", into = "(Option<Record>, Option<Record>)")]
pub struct RecordPair {
    pub tp: Option<Record>,
    pub pro: Option<Record>,
}

impl RecordPair {
    pub fn new(tp: Option<Record>, pro: Option<Record>) -> Self {
        Self { tp, pro }
    }

    /// No record in either category
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<&Record> {
        match category {
            Category::Tp => self.tp.as_ref(),
            Category::Pro => self.pro.as_ref(),
        }
    }
}

impl From<(Option<Record>, Option<Record>)> for RecordPair {
    fn from((tp, pro): (Option<Record>, Option<Record>)) -> Self {
        Self { tp, pro }
    }
}

impl From<RecordPair> for (Option<Record>, Option<Record>) {
    fn from(pair: RecordPair) -> Self {
        (pair.tp, pair.pro)
    }
}

/// Record category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Checkpoints and teleports allowed
    Tp,
    /// No checkpoints
    Pro,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kz_state() -> GameState {
        GameState {
            player_name: Some("Alice".to_string()),
            steam_id: Some(PlayerId::from(123)),
            map_name: Some("kz_bkz_goldbhop".to_string()),
            map_tier: Some(Tier::VeryHard),
            mode: Some(Mode::KzTimer),
            clan: None,
        }
    }

    #[test]
    fn test_game_state_from_json() {
        let json = r#"{
            "player_name": "Alice",
            "steam_id": 123,
            "map_name": "kz_bkz_goldbhop",
            "map_tier": 5,
            "mode": "kz_timer"
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state, kz_state());
    }

    #[test]
    fn test_game_state_all_fields_optional() {
        let state: GameState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, GameState::default());

        let state: GameState =
            serde_json::from_str(r#"{"map_name": null, "mode": null}"#).unwrap();
        assert!(state.map_name.is_none());
        assert!(state.mode.is_none());
    }

    #[test]
    fn test_game_state_invalid_tier_is_not_global() {
        let state: GameState = serde_json::from_str(r#"{"map_tier": 9}"#).unwrap();
        assert!(state.map_tier.is_none());
    }

    #[test]
    fn test_normalize_takes_mode_from_clan_tag() {
        let state: GameState = serde_json::from_str(
            r#"{"map_name": "workshop/123/kz_a", "clan": "[SKZ 1234]"}"#,
        )
        .unwrap();
        let state = state.normalize();
        assert_eq!(state.map_name.as_deref(), Some("kz_a"));
        assert_eq!(state.mode, Some(Mode::SimpleKz));

        // An explicit mode wins over the clan tag
        let state = GameState {
            mode: Some(Mode::Vanilla),
            clan: Some("[KZT]".to_string()),
            ..GameState::default()
        };
        assert_eq!(state.normalize().mode, Some(Mode::Vanilla));

        // A clan tag that is not a mode leaves the mode unset
        let state = GameState {
            clan: Some("[CLAN]".to_string()),
            ..GameState::default()
        };
        assert!(state.normalize().mode.is_none());
    }

    #[test]
    fn test_game_state_malformed_tier_keeps_snapshot() {
        for tier in ["-1", "2.5", "\"hard\"", "[5]", "null"] {
            let json = format!(r#"{{"map_name": "kz_a", "mode": "kz_timer", "map_tier": {}}}"#, tier);
            let state: GameState = serde_json::from_str(&json).unwrap();
            assert_eq!(state.map_name.as_deref(), Some("kz_a"), "tier {}", tier);
            assert!(state.map_tier.is_none(), "tier {}", tier);
        }

        let state: GameState = serde_json::from_str(r#"{"map_tier": 5.0}"#).unwrap();
        assert_eq!(state.map_tier, Some(Tier::VeryHard));
    }

    #[test]
    fn test_player_id_string_form() {
        let state: GameState =
            serde_json::from_str(r#"{"steam_id": "STEAM_1:1:161178172"}"#).unwrap();
        assert_eq!(state.steam_id.unwrap().as_str(), "STEAM_1:1:161178172");
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::from("kz_simple".to_string()), Mode::SimpleKz);
        assert_eq!(Mode::from("VNL".to_string()), Mode::Vanilla);
        assert_eq!(Mode::KzTimer.short(), "KZT");
        assert_eq!(Mode::Unknown("kz_fast".into()).short(), "unknown mode");
        assert_eq!(Mode::Unknown("kz_fast".into()).api_name(), "kz_fast");
    }

    #[test]
    fn test_mode_from_clan_tag() {
        assert_eq!(Mode::from_clan_tag("[KZT 1234]"), Some(Mode::KzTimer));
        assert_eq!(Mode::from_clan_tag("[SKZ]"), Some(Mode::SimpleKz));
        assert_eq!(Mode::from_clan_tag("[CLAN]"), None);
        assert_eq!(Mode::from_clan_tag(""), None);
    }

    #[test]
    fn test_records_query_requires_all_fields() {
        assert!(kz_state().records_query().is_some());

        let mut state = kz_state();
        state.steam_id = None;
        assert!(state.records_query().is_none());

        let mut state = kz_state();
        state.mode = None;
        assert!(state.records_query().is_none());

        let mut state = kz_state();
        state.map_name = Some("surf_map".to_string());
        assert!(state.records_query().is_none());
    }

    #[test]
    fn test_records_query_ignores_player_name() {
        let mut state = kz_state();
        state.player_name = None;
        let query = state.records_query().unwrap();
        assert_eq!(query.map_name, "kz_bkz_goldbhop");
        assert_eq!(query.steam_id, PlayerId::from(123));
    }

    #[test]
    fn test_record_pair_from_json() {
        let json = r#"[{"time": 100.0, "player_name": "Bob"}, null]"#;
        let pair: RecordPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.tp, Some(Record::new(100.0, "Bob")));
        assert!(pair.pro.is_none());
        assert_eq!(pair.get(Category::Tp).map(|r| r.time), Some(100.0));
    }
}
