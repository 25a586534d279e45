#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::doc::{InventoryEntry, PlacedItem};
use crate::geom::Rect;
use crate::hit::InventoryCell;

// =============================================================
// Helpers
// =============================================================

// Garden at client (100, 50), 300x300. Inventory strip below it.
fn layout() -> Layout {
    Layout {
        garden: Rect::new(100.0, 50.0, 300.0, 300.0),
        inventory: Rect::new(100.0, 400.0, 300.0, 60.0),
        cells: vec![
            InventoryCell { kind: "ROSES".into(), rect: Rect::new(100.0, 400.0, 60.0, 60.0) },
            InventoryCell { kind: "WELL".into(), rect: Rect::new(160.0, 400.0, 60.0, 60.0) },
        ],
    }
}

fn doc_with_item() -> (GardenDoc, ItemId) {
    let id = Uuid::new_v4();
    let mut doc = GardenDoc::new();
    doc.load(
        vec![PlacedItem {
            id,
            kind: "ROSES".into(),
            x: 50,
            y: 50,
            remote_id: Some(id),
            revision: 0,
            placed_at_ms: None,
        }],
        vec![
            InventoryEntry { kind: "ROSES".into(), quantity: 2 },
            InventoryEntry { kind: "WELL".into(), quantity: 0 },
        ],
        100,
    );
    (doc, id)
}

fn controller() -> GestureController {
    let mut g = GestureController::new(Bounds::new(300.0, 300.0, 40.0), 4.0);
    g.set_layout(layout());
    g
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

const MOUSE: PointerId = PointerId::Mouse;

// =============================================================
// Taps
// =============================================================

#[test]
fn tap_on_item_selects() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    assert_eq!(g.pointer_down(MOUSE, pt(160.0, 120.0), &doc), None);
    assert!(matches!(g.state(), GestureState::Pressed { .. }));
    g.pointer_move(MOUSE, pt(162.0, 121.0));
    assert!(matches!(g.state(), GestureState::Pressed { .. }));
    assert_eq!(g.pointer_up(MOUSE, pt(162.0, 121.0)), Some(Intent::Select { item: id }));
    assert!(g.is_idle());
}

#[test]
fn press_on_empty_garden_deselects() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    assert_eq!(g.pointer_down(MOUSE, pt(350.0, 300.0), &doc), Some(Intent::Deselect));
    assert!(g.is_idle());
}

#[test]
fn tap_on_inventory_cell_cancels() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(120.0, 420.0), &doc);
    assert_eq!(g.pointer_up(MOUSE, pt(120.0, 420.0)), Some(Intent::Cancel));
}

#[test]
fn empty_inventory_entry_is_not_draggable() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    assert_eq!(g.pointer_down(MOUSE, pt(180.0, 420.0), &doc), None);
    assert!(g.is_idle());
    assert_eq!(g.pointer_up(MOUSE, pt(180.0, 200.0)), None);
}

#[test]
fn press_outside_everything_is_ignored() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    assert_eq!(g.pointer_down(MOUSE, pt(10.0, 10.0), &doc), None);
    assert!(g.is_idle());
}

// =============================================================
// Garden drags
// =============================================================

#[test]
fn garden_drag_keeps_pointer_offset() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    // Local (60, 70) on an item at (50, 50): offset (10, 20).
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    g.pointer_move(MOUSE, pt(260.0, 220.0));

    let view = g.drag_view().unwrap();
    assert_eq!(view.source, DragSource::Garden { item: id });
    assert_eq!(view.at, ItemPos::new(150, 150));
    assert!(view.over_garden);

    assert_eq!(g.pointer_up(MOUSE, pt(260.0, 220.0)), Some(Intent::Move { item: id, at: pt(150.0, 150.0) }));
}

#[test]
fn drag_view_is_clamped_to_bounds() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    g.pointer_move(MOUSE, pt(395.0, 345.0));
    assert_eq!(g.drag_view().unwrap().at, ItemPos::new(260, 260));
    g.pointer_move(MOUSE, pt(-500.0, -500.0));
    let view = g.drag_view().unwrap();
    assert_eq!(view.at, ItemPos::new(0, 0));
    assert!(!view.over_garden);
}

#[test]
fn garden_item_dropped_on_inventory_returns() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    g.pointer_move(MOUSE, pt(250.0, 300.0));
    g.pointer_move(MOUSE, pt(300.0, 430.0));
    assert!(!g.drag_view().unwrap().over_garden);
    assert_eq!(g.pointer_up(MOUSE, pt(300.0, 430.0)), Some(Intent::Return { item: id }));
}

#[test]
fn release_outside_cancels() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    g.pointer_move(MOUSE, pt(600.0, 120.0));
    assert_eq!(g.pointer_up(MOUSE, pt(600.0, 120.0)), Some(Intent::Cancel));
    assert!(g.is_idle());
    assert!(g.drag_view().is_none());
}

#[test]
fn fast_release_without_moves_is_still_a_drag() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    assert_eq!(g.pointer_up(MOUSE, pt(200.0, 120.0)), Some(Intent::Move { item: id, at: pt(90.0, 50.0) }));
}

#[test]
fn cancel_aborts_active_gesture_once() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    g.pointer_move(MOUSE, pt(200.0, 200.0));
    assert_eq!(g.cancel(), Some(Intent::Cancel));
    assert_eq!(g.cancel(), None);
    assert_eq!(g.pointer_up(MOUSE, pt(200.0, 200.0)), None);
}

// =============================================================
// Inventory drags
// =============================================================

#[test]
fn inventory_drag_is_centered_under_pointer() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(120.0, 420.0), &doc);
    g.pointer_move(MOUSE, pt(300.0, 200.0));
    assert_eq!(g.drag_view().unwrap().at, ItemPos::new(180, 130));
    assert_eq!(
        g.pointer_up(MOUSE, pt(300.0, 200.0)),
        Some(Intent::Place { kind: "ROSES".into(), at: pt(180.0, 130.0) })
    );
}

#[test]
fn inventory_drag_back_onto_inventory_cancels() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.pointer_down(MOUSE, pt(120.0, 420.0), &doc);
    g.pointer_move(MOUSE, pt(300.0, 430.0));
    assert_eq!(g.pointer_up(MOUSE, pt(300.0, 430.0)), Some(Intent::Cancel));
}

// =============================================================
// Multi-touch
// =============================================================

#[test]
fn only_first_touch_is_tracked() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    let first = PointerId::Touch(1);
    let second = PointerId::Touch(2);

    g.pointer_down(first, pt(160.0, 120.0), &doc);
    assert_eq!(g.pointer_down(second, pt(350.0, 300.0), &doc), None);
    assert!(!g.pointer_move(second, pt(390.0, 340.0)));
    assert_eq!(g.pointer_up(second, pt(390.0, 340.0)), None);

    g.pointer_move(first, pt(180.0, 140.0));
    assert_eq!(g.pointer_up(first, pt(180.0, 140.0)), Some(Intent::Move { item: id, at: pt(70.0, 70.0) }));
}

#[test]
fn non_finite_pointer_is_ignored() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    assert_eq!(g.pointer_down(MOUSE, pt(f64::NAN, 120.0), &doc), None);
    g.pointer_down(MOUSE, pt(160.0, 120.0), &doc);
    assert!(!g.pointer_move(MOUSE, pt(f64::INFINITY, 0.0)));
}

// =============================================================
// Native drag-and-drop
// =============================================================

#[test]
fn native_inventory_drop_places() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    let raw = r#"{"source":"inventory","kind":"ROSES"}"#;
    assert_eq!(g.native_start(raw, pt(120.0, 420.0), &doc), None);
    assert!(g.native_over(pt(300.0, 200.0)));
    assert!(g.drag_view().unwrap().over_garden);
    assert_eq!(g.native_drop(raw, pt(300.0, 200.0), &doc), Intent::Place { kind: "ROSES".into(), at: pt(180.0, 130.0) });
    assert!(g.is_idle());
    assert_eq!(g.native_end(), None);
}

#[test]
fn native_drop_resolves_garden_payload() {
    let (doc, id) = doc_with_item();
    let mut g = controller();
    let raw = format!(r#"{{"source":"garden","item_id":"{id}"}}"#);
    assert_eq!(g.native_drop(&raw, pt(300.0, 430.0), &doc), Intent::Return { item: id });
}

#[test]
fn native_bad_payloads_cancel() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    let unknown = format!(r#"{{"source":"garden","item_id":"{}"}}"#, Uuid::new_v4());
    for raw in ["garbage", r#"{"source":"inventory","kind":"WELL"}"#, r#"{"source":"inventory","kind":"NOPE"}"#, unknown.as_str()] {
        assert_eq!(g.native_start(raw, pt(120.0, 420.0), &doc), Some(Intent::Cancel), "{raw}");
        assert!(g.is_idle());
        assert_eq!(g.native_drop(raw, pt(300.0, 200.0), &doc), Intent::Cancel, "{raw}");
    }
}

#[test]
fn native_end_without_drop_cancels() {
    let (doc, _) = doc_with_item();
    let mut g = controller();
    g.native_start(r#"{"source":"inventory","kind":"ROSES"}"#, pt(120.0, 420.0), &doc);
    assert_eq!(g.native_end(), Some(Intent::Cancel));
    assert!(g.is_idle());
}

#[test]
fn native_start_replaces_mouse_press_but_not_touch() {
    let (doc, _) = doc_with_item();
    let raw = r#"{"source":"inventory","kind":"ROSES"}"#;

    let mut g = controller();
    g.pointer_down(MOUSE, pt(120.0, 420.0), &doc);
    g.native_start(raw, pt(120.0, 420.0), &doc);
    assert!(matches!(g.state(), GestureState::Dragging { pointer: PointerId::Native, .. }));

    let mut g = controller();
    g.pointer_down(PointerId::Touch(0), pt(160.0, 120.0), &doc);
    assert_eq!(g.native_start(raw, pt(120.0, 420.0), &doc), None);
    assert!(matches!(g.state(), GestureState::Pressed { pointer: PointerId::Touch(0), .. }));
}
