use uuid::Uuid;

use super::*;

fn placed(x: i32, y: i32) -> PlacedItem {
    PlacedItem {
        id: Uuid::new_v4(),
        kind: "ROSES".into(),
        x,
        y,
        remote_id: None,
        revision: 0,
        placed_at_ms: None,
    }
}

fn layout() -> Layout {
    Layout {
        garden: Rect::new(10.0, 10.0, 300.0, 300.0),
        inventory: Rect::new(10.0, 320.0, 300.0, 60.0),
        cells: vec![
            InventoryCell { kind: "ROSES".into(), rect: Rect::new(10.0, 320.0, 60.0, 60.0) },
            InventoryCell { kind: "WELL".into(), rect: Rect::new(70.0, 320.0, 60.0, 60.0) },
        ],
    }
}

// =============================================================
// Items
// =============================================================

#[test]
fn item_hit_uses_footprint() {
    let items = vec![placed(100, 100)];
    assert!(item_at(&items, Point::new(100.0, 100.0), 40.0).is_some());
    assert!(item_at(&items, Point::new(139.5, 139.5), 40.0).is_some());
    assert!(item_at(&items, Point::new(140.0, 120.0), 40.0).is_none());
    assert!(item_at(&items, Point::new(99.0, 120.0), 40.0).is_none());
}

#[test]
fn shared_edge_belongs_to_right_neighbour() {
    let items = vec![placed(40, 0), placed(0, 0)];
    let hit = item_at(&items, Point::new(40.0, 10.0), 40.0).unwrap();
    assert_eq!(hit.id, items[0].id);
    let hit = item_at(&items, Point::new(39.9, 10.0), 40.0).unwrap();
    assert_eq!(hit.id, items[1].id);
}

#[test]
fn topmost_item_wins() {
    let items = vec![placed(100, 100), placed(120, 120)];
    let hit = item_at(&items, Point::new(130.0, 130.0), 40.0).unwrap();
    assert_eq!(hit.id, items[1].id);
}

#[test]
fn non_finite_point_hits_nothing() {
    let items = vec![placed(0, 0)];
    assert!(item_at(&items, Point::new(f64::NAN, 10.0), 40.0).is_none());
}

// =============================================================
// Zones and cells
// =============================================================

#[test]
fn zones_by_containment() {
    let l = layout();
    assert_eq!(l.zone(Point::new(50.0, 50.0)), DropZone::Garden);
    assert_eq!(l.zone(Point::new(50.0, 350.0)), DropZone::Inventory);
    assert_eq!(l.zone(Point::new(500.0, 50.0)), DropZone::Outside);
    assert_eq!(l.zone(Point::new(5.0, 5.0)), DropZone::Outside);
}

#[test]
fn cell_lookup() {
    let l = layout();
    assert_eq!(l.cell_at(Point::new(80.0, 330.0)).map(|c| c.kind.as_str()), Some("WELL"));
    assert_eq!(l.cell_at(Point::new(20.0, 330.0)).map(|c| c.kind.as_str()), Some("ROSES"));
    assert!(l.cell_at(Point::new(200.0, 330.0)).is_none());
    assert!(l.cell_at(Point::new(20.0, 100.0)).is_none());
}
