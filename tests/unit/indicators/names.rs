//! Unit tests for the indicator name registry

use alertrix::indicators::names;

#[test]
fn abbreviated_key_resolves_to_display_name() {
    assert_eq!(names::display_name("extreme_zones"), "Extreme Zones");
    assert_eq!(names::display_name("nautilus"), "Nautilus™");
}

#[test]
fn display_name_resolves_back_to_key() {
    assert_eq!(names::short_key("Extreme Zones"), "extreme_zones");
    assert_eq!(names::short_key("Nautilus™"), "nautilus");
}

#[test]
fn unmapped_names_pass_through_unchanged() {
    assert_eq!(names::display_name("Custom Indicator"), "Custom Indicator");
    assert_eq!(names::short_key("custom_key"), "custom_key");
}

#[test]
fn same_indicator_bridges_both_representations() {
    assert!(names::same_indicator("nautilus", "Nautilus™"));
    assert!(names::same_indicator("Nautilus™", "nautilus"));
    assert!(names::same_indicator("nautilus", "nautilus"));
    assert!(!names::same_indicator("nautilus", "Extreme Zones"));
}
