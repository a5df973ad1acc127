//! Batting zone construction, membership, and persistence tests.

use shotreel::{BattingZone, ShotError};

// ── Construction ───────────────────────────────────────────────────

#[test]
fn inverted_corners_rejected() {
    let result = BattingZone::new(300, 100, 100, 300);
    match result {
        Err(ShotError::InvalidZone { x1, x2, .. }) => {
            assert_eq!(x1, 300);
            assert_eq!(x2, 100);
        }
        other => panic!("Expected InvalidZone, got: {other:?}"),
    }
    assert!(BattingZone::new(0, 10, 5, 9).is_err());
}

#[test]
fn degenerate_zone_allowed() {
    let zone = BattingZone::new(50, 50, 50, 50).unwrap();
    assert_eq!(zone.width(), 0);
    assert!(zone.contains(50.0, 50.0));
    assert!(!zone.contains(50.5, 50.0));
}

#[test]
fn from_selection_unscales_and_truncates() {
    // 0.5 preview: a 100x60 box at (10, 21) maps to (20, 42)-(220, 162).
    let zone = BattingZone::from_selection(10.0, 21.0, 100.0, 60.0, 0.5).unwrap();
    assert_eq!((zone.x1(), zone.y1(), zone.x2(), zone.y2()), (20, 42, 220, 162));

    let zone = BattingZone::from_selection(10.0, 10.0, 10.0, 10.0, 0.3).unwrap();
    assert_eq!(zone.x1(), 33);
    assert_eq!(zone.x2(), 66);
}

#[test]
fn from_selection_rejects_bad_scale() {
    assert!(matches!(
        BattingZone::from_selection(0.0, 0.0, 10.0, 10.0, 0.0),
        Err(ShotError::InvalidConfig(_))
    ));
    assert!(BattingZone::from_selection(0.0, 0.0, 10.0, 10.0, f64::NAN).is_err());
}

// ── Membership ─────────────────────────────────────────────────────

#[test]
fn contains_is_inclusive_on_every_edge() {
    let zone = BattingZone::new(100, 100, 300, 300).unwrap();
    for (x, y) in [(100.0, 200.0), (300.0, 200.0), (200.0, 100.0), (200.0, 300.0), (100.0, 300.0)] {
        assert!(zone.contains(x, y), "({x}, {y}) should be inside");
    }
    for (x, y) in [(99.9, 200.0), (300.1, 200.0), (200.0, 99.0), (200.0, 301.0)] {
        assert!(!zone.contains(x, y), "({x}, {y}) should be outside");
    }
}

#[test]
fn contains_corners_and_centre_but_not_left_of_x1() {
    let zone = BattingZone::new(120, 80, 340, 260).unwrap();
    let (x1, y1, x2, y2) = (120.0, 80.0, 340.0, 260.0);

    assert!(zone.contains(x1, y1));
    assert!(zone.contains(x2, y2));
    assert!(zone.contains((x1 + x2) / 2.0, (y1 + y2) / 2.0));
    for (x, y) in [(x1 - 1.0, y1), (x1 - 1.0, (y1 + y2) / 2.0)] {
        assert!(!zone.contains(x, y), "({x}, {y}) should be outside");
    }
}

#[test]
fn display_lists_corners() {
    let zone = BattingZone::new(1, 2, 3, 4).unwrap();
    assert_eq!(zone.to_string(), "(1, 2)-(3, 4)");
}

// ── Persistence ────────────────────────────────────────────────────

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batting_zone.json");

    let zone = BattingZone::new(420, 180, 860, 700).unwrap();
    zone.save(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(value["x1"], 420);
    assert_eq!(value["y2"], 700);

    assert_eq!(BattingZone::load(&path).unwrap(), zone);
}

#[test]
fn load_missing_file_is_zone_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let error = BattingZone::load(dir.path().join("batting_zone.json")).unwrap_err();
    assert!(matches!(error, ShotError::ZoneNotFound { .. }));
    assert!(error.is_precondition());
    assert!(error.to_string().contains("select a zone"));
}

#[test]
fn load_inverted_record_is_invalid_zone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zone.json");
    std::fs::write(&path, r#"{"x1": 10, "y1": 10, "x2": 5, "y2": 20}"#).unwrap();

    assert!(matches!(
        BattingZone::load(&path),
        Err(ShotError::InvalidZone { .. })
    ));
}

#[test]
fn load_garbage_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zone.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    assert!(matches!(BattingZone::load(&path), Err(ShotError::JsonError(_))));
}
