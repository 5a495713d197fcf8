//! Bidirectional mapping between abbreviated indicator keys and the
//! display names alerts carry.
//!
//! Strategy rules are written with short internal keys; alerts arrive
//! tagged with the indicator's display name. Unmapped names pass through
//! unchanged; an unknown indicator is never an error.

const NAME_TABLE: &[(&str, &str)] = &[
    ("nautilus", "Nautilus™"),
    ("extreme_zones", "Extreme Zones"),
    ("osc_matrix", "Oscillator Matrix™"),
    ("pac", "Price Action Concepts™"),
    ("sno", "Signals & Overlays™"),
    ("smart_trail", "Smart Trail"),
    ("trend_tracer", "Trend Tracer"),
    ("rev_zones", "Reversal Zones"),
];

/// Resolve an abbreviated key to its display name. Display names and
/// unknown keys are returned unchanged.
pub fn display_name(name: &str) -> &str {
    NAME_TABLE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, display)| *display)
        .unwrap_or(name)
}

/// Resolve a display name back to its abbreviated key. Keys and unknown
/// names are returned unchanged.
pub fn short_key(name: &str) -> &str {
    NAME_TABLE
        .iter()
        .find(|(_, display)| *display == name)
        .map(|(key, _)| *key)
        .unwrap_or(name)
}

/// Whether two indicator names refer to the same indicator, regardless of
/// which representation each side uses.
pub fn same_indicator(a: &str, b: &str) -> bool {
    display_name(a) == display_name(b)
}
