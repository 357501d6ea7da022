//! Integration test for the build-time version wiring.

use fitframe_widget::widget_version;

#[test]
fn version_matches_root_version_file() {
    let expected = include_str!("../../../VERSION").trim();
    assert_eq!(widget_version(), expected);
    assert!(!widget_version().is_empty());
}
