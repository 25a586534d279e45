#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::geom::Rect;
use crate::hit::InventoryCell;
use crate::persist::memory::MemoryStore;
use crate::persist::{Operation, execute, load_garden};

// =============================================================
// Helpers
// =============================================================

// Garden at client (100, 50), 300x300; inventory strip below with ROSES and WELL cells.
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

/// Engine hydrated from a store holding one ROSES at (50, 50), two more in
/// inventory and 500 coins.
async fn setup() -> (EngineCore, MemoryStore, ItemId) {
    let user = Uuid::new_v4();
    let store = MemoryStore::new();
    let record = store.seed_item(user, "ROSES", 50, 50);
    store.seed_inventory(user, "ROSES", 2);
    store.seed_currency(user, 500);

    let mut core = EngineCore::new(user, Catalog::bundled().unwrap(), GardenConfig::default(), 7).unwrap();
    core.set_layout(layout());
    let (items, inventory) = load_garden(&store, user).await.unwrap();
    core.hydrate(items, inventory, store.currency_of(user));
    (core, store, record.id)
}

/// Execute every `Persist` action (and its follow-ups); return the rest.
async fn run(core: &mut EngineCore, store: &MemoryStore, actions: Vec<Action>) -> Vec<Action> {
    let mut queue = actions;
    let mut rest = Vec::new();
    while !queue.is_empty() {
        let mut next = Vec::new();
        for action in queue {
            match action {
                Action::Persist(pending) => {
                    let settlement = execute(store, core.garden().user(), pending).await;
                    next.extend(core.settle(settlement));
                }
                other => rest.push(other),
            }
        }
        queue = next;
    }
    rest
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn notices(actions: &[Action]) -> Vec<&str> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Notice { message } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

// =============================================================
// Taps and selection
// =============================================================

#[tokio::test]
async fn tap_selects_without_persisting() {
    let (mut core, store, id) = setup().await;
    assert!(core.on_pointer_down(pt(160.0, 120.0), 0.0).is_empty());
    let actions = core.on_pointer_up(pt(161.0, 121.0), 0.0);
    assert_eq!(actions, vec![Action::SelectionChanged { item: Some(id) }]);
    assert_eq!(core.selection(), Some(id));
    assert_eq!(core.scene(0.0).selected, Some(id));
    assert!(!store.calls().contains(&Operation::UpdatePosition));
}

#[tokio::test]
async fn press_on_empty_garden_clears_selection() {
    let (mut core, _store, _) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_up(pt(160.0, 120.0), 0.0);
    assert_eq!(core.on_pointer_down(pt(380.0, 330.0), 0.0), vec![Action::SelectionChanged { item: None }]);
    assert_eq!(core.selection(), None);
    assert!(core.on_pointer_down(pt(380.0, 330.0), 0.0).is_empty());
}

// =============================================================
// Garden drags
// =============================================================

#[tokio::test]
async fn dragged_item_follows_pointer_minus_offset() {
    let (mut core, store, id) = setup().await;
    // Press 10px right and 20px below the item's top-left.
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_move(pt(260.0, 220.0));

    let scene = core.scene(16.0);
    assert!(scene.items.is_empty());
    let dragged = scene.dragged.unwrap();
    assert_eq!((dragged.id, dragged.x, dragged.y), (Some(id), 150.0, 150.0));
    let preview = scene.preview.unwrap();
    assert_eq!((preview.x, preview.y), (150.0, 150.0));

    let actions = core.on_pointer_up(pt(260.0, 220.0), 16.0);
    let rest = run(&mut core, &store, actions).await;
    assert!(rest.is_empty());
    assert_eq!(core.garden().placed()[0].pos(), ItemPos::new(150, 150));
    let stored = store.items_of(core.garden().user());
    assert_eq!((stored[0].x, stored[0].y), (150, 150));
}

#[tokio::test]
async fn drag_to_inventory_returns_item() {
    let (mut core, store, _) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_move(pt(250.0, 300.0));
    core.on_pointer_move(pt(300.0, 430.0));
    assert!(core.scene(0.0).preview.is_none());

    let actions = core.on_pointer_up(pt(300.0, 430.0), 0.0);
    assert!(actions.contains(&Action::InventoryChanged));
    assert!(core.garden().placed().is_empty());
    assert_eq!(core.garden().doc().quantity("ROSES"), 3);

    assert!(notices(&run(&mut core, &store, actions).await).is_empty());
    let user = core.garden().user();
    assert!(store.items_of(user).is_empty());
    assert_eq!(store.quantity_of(user, "ROSES"), 3);
}

#[tokio::test]
async fn returning_selected_item_clears_selection() {
    let (mut core, _store, id) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_up(pt(160.0, 120.0), 0.0);
    assert_eq!(core.selection(), Some(id));

    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    let actions = core.on_pointer_up(pt(300.0, 430.0), 0.0);
    assert!(actions.contains(&Action::SelectionChanged { item: None }));
    assert_eq!(core.selection(), None);
}

#[tokio::test]
async fn cancelled_drag_leaves_item_in_place() {
    let (mut core, store, id) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_move(pt(300.0, 300.0));
    assert!(core.on_cancel().is_empty());

    let scene = core.scene(0.0);
    assert!(scene.dragged.is_none());
    assert_eq!(scene.items[0].id, Some(id));
    assert_eq!((scene.items[0].x, scene.items[0].y), (50.0, 50.0));
    assert!(!store.calls().contains(&Operation::UpdatePosition));
}

#[tokio::test]
async fn release_outside_everything_changes_nothing() {
    let (mut core, _store, _) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_move(pt(700.0, 120.0));
    assert!(core.on_pointer_up(pt(700.0, 120.0), 0.0).is_empty());
    assert_eq!(core.garden().placed()[0].pos(), ItemPos::new(50, 50));
}

// =============================================================
// Inventory drags
// =============================================================

#[tokio::test]
async fn inventory_drop_places_with_pop_in() {
    let (mut core, store, _) = setup().await;
    core.on_pointer_down(pt(120.0, 420.0), 1000.0);
    core.on_pointer_move(pt(300.0, 200.0));

    let scene = core.scene(1000.0);
    assert!(scene.dragged.is_none());
    let ghost = scene.preview.unwrap().ghost.unwrap();
    assert_eq!((ghost.kind.as_str(), ghost.x, ghost.y), ("ROSES", 180.0, 130.0));

    let actions = core.on_pointer_up(pt(300.0, 200.0), 1000.0);
    assert_eq!(core.garden().doc().quantity("ROSES"), 1);
    assert!(notices(&run(&mut core, &store, actions).await).is_empty());

    let fresh = core.scene(1100.0);
    let placed = fresh.items.iter().find(|i| i.x == 180.0).unwrap();
    assert!(placed.pop < 1.0);
    let later = core.scene(5000.0);
    assert!(later.items.iter().all(|i| i.pop == 1.0));
    assert_eq!(store.items_of(core.garden().user()).len(), 2);
}

#[tokio::test]
async fn failed_place_rolls_back_with_notice() {
    let (mut core, store, _) = setup().await;
    store.fail(Operation::CreateItem);
    core.on_pointer_down(pt(120.0, 420.0), 0.0);
    let actions = core.on_pointer_up(pt(300.0, 200.0), 0.0);
    assert_eq!(core.garden().placed().len(), 2);

    let rest = run(&mut core, &store, actions).await;
    assert_eq!(notices(&rest), ["Could not place the item. It is back in your inventory."]);
    assert!(rest.contains(&Action::InventoryChanged));
    assert_eq!(core.garden().placed().len(), 1);
    assert_eq!(core.garden().doc().quantity("ROSES"), 2);
    assert_eq!(store.quantity_of(core.garden().user(), "ROSES"), 2);
}

#[tokio::test]
async fn empty_inventory_cell_does_not_drag() {
    let (mut core, _store, _) = setup().await;
    core.on_pointer_down(pt(180.0, 420.0), 0.0);
    core.on_pointer_move(pt(300.0, 200.0));
    assert!(core.scene(0.0).preview.is_none());
    assert!(core.on_pointer_up(pt(300.0, 200.0), 0.0).is_empty());
}

// =============================================================
// Touch and native drag-and-drop
// =============================================================

#[tokio::test]
async fn second_touch_is_ignored() {
    let (mut core, _store, id) = setup().await;
    let first = TouchPoint { id: 3, client: pt(160.0, 120.0) };
    let second = TouchPoint { id: 4, client: pt(380.0, 330.0) };

    core.on_touch_start(&[first], 0.0);
    assert!(core.on_touch_start(&[second], 0.0).is_empty());
    core.on_touch_move(&[TouchPoint { id: 4, client: pt(390.0, 340.0) }, TouchPoint { id: 3, client: pt(180.0, 140.0) }]);
    assert!(core.on_touch_end(&[TouchPoint { id: 4, client: pt(390.0, 340.0) }], 0.0).is_empty());

    let actions = core.on_touch_end(&[TouchPoint { id: 3, client: pt(180.0, 140.0) }], 0.0);
    assert!(matches!(actions.as_slice(), [Action::Persist(_)]));
    assert_eq!(core.garden().doc().item(&id).unwrap().pos(), ItemPos::new(70, 70));
}

#[tokio::test]
async fn native_drop_places_from_payload() {
    let (mut core, store, _) = setup().await;
    let payload = r#"{"source":"inventory","kind":"ROSES"}"#;
    assert!(core.on_native_drag_start(payload, pt(120.0, 420.0)).is_empty());
    core.on_native_drag_over(pt(300.0, 200.0));
    let actions = core.on_native_drop(payload, pt(300.0, 200.0), 0.0);
    run(&mut core, &store, actions).await;
    assert!(core.on_native_drag_end().is_empty());
    assert_eq!(core.garden().placed().len(), 2);
    assert_eq!(store.items_of(core.garden().user()).len(), 2);
}

#[tokio::test]
async fn malformed_native_payload_is_cancelled() {
    let (mut core, store, _) = setup().await;
    assert!(core.on_native_drop("{\"source\":", pt(300.0, 200.0), 0.0).is_empty());
    assert_eq!(core.garden().placed().len(), 1);
    assert!(!store.calls().contains(&Operation::CreateItem));
}

// =============================================================
// Shop
// =============================================================

#[tokio::test]
async fn purchase_adds_inventory() {
    let (mut core, store, _) = setup().await;
    let actions = core.purchase("WELL");
    assert!(actions.contains(&Action::InventoryChanged));
    assert_eq!(core.garden().currency(), 100);
    run(&mut core, &store, actions).await;
    assert_eq!(store.quantity_of(core.garden().user(), "WELL"), 1);
    assert_eq!(store.currency_of(core.garden().user()), 100);
}

#[tokio::test]
async fn purchase_without_funds_is_refused() {
    let (mut core, store, _) = setup().await;
    let actions = core.purchase("WATERFALL");
    assert_eq!(notices(&actions), ["You need 750 coins but only have 500."]);
    assert!(!store.calls().contains(&Operation::SetCurrency));
}

// =============================================================
// Animation
// =============================================================

#[tokio::test]
async fn ticks_populate_particles_deterministically() {
    let (mut a, _, _) = setup().await;
    let (mut b, _, _) = setup().await;
    for frame in 0..30 {
        let now = f64::from(frame) * 16.0;
        a.tick(now);
        b.tick(now);
    }
    assert!(!a.particles().is_empty());
    assert!(a.particles().len() <= a.config().particle_max);
    let (sa, sb) = (a.scene(480.0), b.scene(480.0));
    assert_eq!(sa.particles, sb.particles);
    assert_eq!(sa.texture_seed, sb.texture_seed);
    assert_eq!(sa.elapsed_ms, 480.0);
    assert!(sa.wind.abs() <= 0.5);
}

#[tokio::test]
async fn hydrate_resets_selection_and_gesture() {
    let (mut core, _store, _) = setup().await;
    core.on_pointer_down(pt(160.0, 120.0), 0.0);
    core.on_pointer_up(pt(160.0, 120.0), 0.0);
    core.on_pointer_down(pt(160.0, 120.0), 0.0);

    let actions = core.hydrate(Vec::new(), Vec::new(), 0);
    assert_eq!(actions, vec![Action::InventoryChanged, Action::SelectionChanged { item: None }]);
    assert!(core.gesture().is_idle());
    assert!(core.scene(0.0).items.is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = GardenConfig { item_size: 0.0, ..GardenConfig::default() };
    assert!(EngineCore::new(Uuid::new_v4(), Catalog::bundled().unwrap(), config, 1).is_err());
}
