#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = GardenConfig::from_json("{}").unwrap();
    assert_eq!(cfg, GardenConfig::default());
    assert_eq!(cfg.width, DEFAULT_CANVAS_WIDTH);
    assert_eq!(cfg.item_size, DEFAULT_ITEM_SIZE);
    assert_eq!(cfg.particle_target, DEFAULT_PARTICLE_TARGET);
}

#[test]
fn partial_override_keeps_other_defaults() {
    let cfg = GardenConfig::from_json(r#"{"width": 640, "tap_slop_px": 8}"#).unwrap();
    assert_eq!(cfg.width, 640.0);
    assert_eq!(cfg.tap_slop_px, 8.0);
    assert_eq!(cfg.height, DEFAULT_CANVAS_HEIGHT);
}

#[test]
fn malformed_json_is_error() {
    let err = GardenConfig::from_json("{width:").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn zero_width_is_rejected() {
    let err = GardenConfig::from_json(r#"{"width": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "width", .. }));
}

#[test]
fn negative_slop_is_rejected() {
    let err = GardenConfig::from_json(r#"{"tap_slop_px": -1}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "tap_slop_px", .. }));
}

#[test]
fn particle_max_below_target_is_rejected() {
    let err = GardenConfig::from_json(r#"{"particle_target": 20, "particle_max": 10}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "particle_max", .. }));
}

#[test]
fn bounds_mirror_config() {
    let cfg = GardenConfig { width: 500.0, height: 200.0, item_size: 32.0, ..GardenConfig::default() };
    let b = cfg.bounds();
    assert_eq!(b.max_origin(), (468.0, 168.0));
}

#[test]
fn asset_url_joins_with_single_slash() {
    let cfg = GardenConfig { asset_base_url: "https://cdn.test/img/".into(), ..GardenConfig::default() };
    assert_eq!(cfg.asset_url("/flowers/Red.png"), "https://cdn.test/img/flowers/Red.png");
    let bare = GardenConfig::default();
    assert_eq!(bare.asset_url("/flowers/Red.png"), "/flowers/Red.png");
}
