//! Map name utilities
//!
//! Functions for classifying and normalising KZ map names as reported by
//! the game state feed.

/// Map name prefixes recognised as KZ maps.
pub const KZ_MAP_PREFIXES: [&str; 6] = ["bkz_", "kz_", "kzpro_", "skz_", "vnl_", "xc_"];

/// Check whether a map name belongs to a supported KZ map category.
///
/// Matching is case-sensitive and prefix-exact.
///
/// # Examples
///
/// ```
/// use kz_record_overlay::core::map_utils::is_kz_map;
///
/// assert!(is_kz_map(Some("kz_longjumps")));
/// assert!(!is_kz_map(Some("surf_map")));
/// assert!(!is_kz_map(None));
/// ```
pub fn is_kz_map(map_name: Option<&str>) -> bool {
    match map_name {
        Some(name) => KZ_MAP_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix)),
        None => false,
    }
}

/// Strip a workshop path (`workshop/<id>/`) from a map name.
///
/// Workshop maps are reported with their subscription path; the records
/// service only knows the bare map name.
///
/// # Examples
///
/// ```
/// use kz_record_overlay::core::map_utils::strip_workshop_path;
///
/// assert_eq!(strip_workshop_path("workshop/1234/kz_beginnerblock"), "kz_beginnerblock");
/// assert_eq!(strip_workshop_path("kz_beginnerblock"), "kz_beginnerblock");
/// ```
pub fn strip_workshop_path(map_name: &str) -> &str {
    map_name
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(map_name)
}
