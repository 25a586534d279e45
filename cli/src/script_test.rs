use garden_canvas::catalog::Catalog;
use garden_canvas::config::GardenConfig;
use garden_canvas::input::DragPayload;

use super::*;

const SCRIPT: &str = r#"{
  "layout": {
    "garden": { "x": 100, "y": 50, "width": 300, "height": 300 },
    "inventory": { "x": 100, "y": 400, "width": 300, "height": 60 },
    "cells": [ { "kind": "ROSES", "rect": { "x": 100, "y": 400, "width": 60, "height": 60 } } ]
  },
  "garden": {
    "currency": 500,
    "inventory": [ { "kind": "ROSES", "quantity": 2 } ],
    "items": [ { "kind": "ROSES", "x": 50, "y": 50 } ]
  },
  "steps": [
    { "step": "pointer_down", "x": 120, "y": 420 },
    { "step": "pointer_move", "x": 300, "y": 200 },
    { "step": "pointer_up", "x": 300, "y": 200, "at_ms": 16 }
  ]
}"#;

async fn replay(script: &Script, failing: &[Operation]) -> Replay {
    let mut replay = Replay::start(script, Catalog::bundled().unwrap(), GardenConfig::default(), 1, failing)
        .await
        .unwrap();
    replay.run(&script.steps).await;
    replay
}

#[test]
fn bare_step_list_parses() {
    let script = Script::parse(r#"[{"step":"tick","at_ms":16},{"step":"cancel"},{"step":"heal"}]"#).unwrap();
    assert_eq!(script.steps, vec![Step::Tick { at_ms: 16.0 }, Step::Cancel, Step::Heal]);
    assert!(script.layout.is_none());
    assert_eq!(script.garden, Fixture::default());
}

#[test]
fn unknown_step_is_rejected() {
    assert!(matches!(Script::parse(r#"[{"step":"jump"}]"#), Err(CliError::Script(_))));
}

#[test]
fn default_layout_covers_garden() {
    let config = GardenConfig::default();
    let layout = Script::default().layout_for(&config);
    assert_eq!(layout.garden, Rect::new(0.0, 0.0, config.width, config.height));
    assert!(layout.cells.is_empty());
}

#[test]
fn payload_accepts_string_or_object() {
    let raw = r#"{"source":"inventory","kind":"ROSES"}"#;
    assert_eq!(payload_text(&Value::String(raw.into())), raw);
    let object: Value = serde_json::from_str(raw).unwrap();
    let expected = DragPayload::Inventory { kind: "ROSES".into() };
    assert_eq!(DragPayload::parse(&payload_text(&object)).unwrap(), expected);
    assert_eq!(DragPayload::parse(raw).unwrap(), expected);
}

#[tokio::test]
async fn inventory_drag_is_persisted() {
    let script = Script::parse(SCRIPT).unwrap();
    let replay = replay(&script, &[]).await;
    let report = replay.report();
    assert_eq!(report.placed.len(), 2);
    assert_eq!(report.in_flight, 0);
    assert!(report.notices.is_empty());
    assert_eq!(report.persisted.items.len(), 2);
    assert_eq!(report.persisted.inventory, vec![InventoryEntry { kind: "ROSES".into(), quantity: 1 }]);
}

#[tokio::test]
async fn injected_failure_rolls_back() {
    let script = Script::parse(SCRIPT).unwrap();
    let replay = replay(&script, &[Operation::CreateItem]).await;
    assert_eq!(replay.notices(), ["Could not place the item. It is back in your inventory."]);
    let report = replay.report();
    assert_eq!(report.placed.len(), 1);
    assert_eq!(report.persisted.items.len(), 1);
    assert_eq!(replay.core().garden().doc().quantity("ROSES"), 2);
}

#[tokio::test]
async fn purchase_and_native_drop() {
    let mut script = Script::parse(SCRIPT).unwrap();
    script.steps = vec![
        Step::Purchase { kind: "ROSES".into() },
        Step::NativeDrop {
            payload: serde_json::json!({ "source": "inventory", "kind": "ROSES" }),
            x: 300.0,
            y: 200.0,
            at_ms: 0.0,
        },
    ];
    let replay = replay(&script, &[]).await;
    let report = replay.report();
    assert_eq!(report.currency, 350);
    assert_eq!(report.persisted.currency, 350);
    assert_eq!(report.placed.len(), 2);
    assert_eq!(report.persisted.inventory, vec![InventoryEntry { kind: "ROSES".into(), quantity: 2 }]);
}
