use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::assets::{AssetCache, ImageLoader};
use crate::catalog::Catalog;
use crate::config::{ConfigError, GardenConfig};
use crate::doc::{InventoryEntry, ItemId, PlacedItem, UserId};
use crate::garden::{GardenController, GardenError};
use crate::geom::{ItemPos, Point};
use crate::gesture::{DragView, GestureController, Intent};
use crate::hit::Layout;
use crate::input::{DragSource, PointerId, TouchPoint};
use crate::particles::{ParticleSystem, Season, SeasonClock, Wind};
use crate::persist::{ItemRecord, Pending, Settlement};
use crate::render::{self, DragPreview, Scene, SceneItem};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Run these writes through persistence and hand the result to `settle`.
    Persist(Pending),
    SelectionChanged { item: Option<ItemId> },
    /// Inventory counts or currency changed; the host should redraw its list.
    InventoryChanged,
    /// User-facing message.
    Notice { message: String },
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    config: GardenConfig,
    garden: GardenController,
    gesture: GestureController,
    particles: ParticleSystem,
    wind: Wind,
    seasons: SeasonClock,
    rng: SmallRng,
    selected: Option<ItemId>,
    started_ms: Option<f64>,
    texture_seed: u64,
    dpr: f64,
}

impl EngineCore {
    /// Build an engine for `user`. `seed` drives every random choice.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(user: UserId, catalog: Catalog, config: GardenConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = config.bounds();
        Ok(Self {
            garden: GardenController::new(user, catalog, bounds),
            gesture: GestureController::new(bounds, config.tap_slop_px),
            particles: ParticleSystem::new(config.width, config.height, config.particle_target, config.particle_max),
            wind: Wind::default(),
            seasons: SeasonClock::new(config.season_period_ms, Season::Spring),
            rng: SmallRng::seed_from_u64(seed),
            selected: None,
            started_ms: None,
            texture_seed: seed,
            dpr: 1.0,
            config,
        })
    }

    // --- Data inputs ---

    /// Replace garden state with a loaded snapshot.
    pub fn hydrate(&mut self, items: Vec<ItemRecord>, inventory: Vec<InventoryEntry>, currency: u64) -> Vec<Action> {
        self.gesture.cancel();
        self.garden.hydrate(items, inventory, currency);
        let mut actions = vec![Action::InventoryChanged];
        if self.selected.take().is_some() {
            actions.push(Action::SelectionChanged { item: None });
        }
        actions
    }

    /// Apply persistence results for an earlier [`Action::Persist`].
    pub fn settle(&mut self, settlement: Settlement) -> Vec<Action> {
        let settled = self.garden.settle(settlement);
        let mut actions: Vec<Action> = settled.followups.into_iter().map(Action::Persist).collect();
        if let Some(err) = settled.error {
            actions.push(Action::InventoryChanged);
            actions.push(notice(&err));
        }
        actions.extend(self.prune_selection());
        actions
    }

    /// Buy one `kind` from the shop.
    pub fn purchase(&mut self, kind: &str) -> Vec<Action> {
        match self.garden.purchase(kind) {
            Ok(pending) => vec![Action::Persist(pending), Action::InventoryChanged],
            Err(err) => vec![notice(&err)],
        }
    }

    /// Update the client-space geometry of garden and inventory.
    pub fn set_layout(&mut self, layout: Layout) {
        self.gesture.set_layout(layout);
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        if dpr.is_finite() && dpr > 0.0 {
            self.dpr = dpr;
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        let intent = self.gesture.pointer_down(PointerId::Mouse, client, self.garden.doc());
        self.apply(intent, now_ms)
    }

    pub fn on_pointer_move(&mut self, client: Point) {
        self.gesture.pointer_move(PointerId::Mouse, client);
    }

    pub fn on_pointer_up(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        let intent = self.gesture.pointer_up(PointerId::Mouse, client);
        self.apply(intent, now_ms)
    }

    /// `touchstart`. Only the first changed touch can open a gesture.
    pub fn on_touch_start(&mut self, changed: &[TouchPoint], now_ms: f64) -> Vec<Action> {
        let Some(first) = changed.first() else {
            return Vec::new();
        };
        let intent = self.gesture.pointer_down(PointerId::Touch(first.id), first.client, self.garden.doc());
        self.apply(intent, now_ms)
    }

    pub fn on_touch_move(&mut self, changed: &[TouchPoint]) {
        for touch in changed {
            self.gesture.pointer_move(PointerId::Touch(touch.id), touch.client);
        }
    }

    pub fn on_touch_end(&mut self, changed: &[TouchPoint], now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        for touch in changed {
            let intent = self.gesture.pointer_up(PointerId::Touch(touch.id), touch.client);
            actions.extend(self.apply(intent, now_ms));
        }
        actions
    }

    /// `pointercancel`, `touchcancel`, Escape.
    pub fn on_cancel(&mut self) -> Vec<Action> {
        let intent = self.gesture.cancel();
        self.apply(intent, 0.0)
    }

    pub fn on_native_drag_start(&mut self, payload: &str, client: Point) -> Vec<Action> {
        let intent = self.gesture.native_start(payload, client, self.garden.doc());
        self.apply(intent, 0.0)
    }

    pub fn on_native_drag_over(&mut self, client: Point) {
        self.gesture.native_over(client);
    }

    pub fn on_native_drop(&mut self, payload: &str, client: Point, now_ms: f64) -> Vec<Action> {
        let intent = self.gesture.native_drop(payload, client, self.garden.doc());
        self.apply(Some(intent), now_ms)
    }

    pub fn on_native_drag_end(&mut self) -> Vec<Action> {
        let intent = self.gesture.native_end();
        self.apply(intent, 0.0)
    }

    // --- Animation ---

    /// Advance wind and particles by one frame.
    pub fn tick(&mut self, now_ms: f64) {
        let started = *self.started_ms.get_or_insert(now_ms);
        let season = self.seasons.season_at(now_ms - started);
        self.wind.step(&mut self.rng);
        self.particles.tick(season, self.wind, &mut self.rng);
        self.texture_seed = self.rng.random();
    }

    /// Snapshot of everything the renderer draws at `now_ms`.
    #[must_use]
    pub fn scene(&self, now_ms: f64) -> Scene {
        let view = self.gesture.drag_view();
        let dragged_id = match &view {
            Some(DragView { source: DragSource::Garden { item }, .. }) => Some(*item),
            _ => None,
        };

        let items = self
            .garden
            .placed()
            .iter()
            .filter(|item| Some(item.id) != dragged_id)
            .filter_map(|item| self.placed_scene_item(item, now_ms))
            .collect();

        let (dragged, preview) = match view {
            Some(view) => self.drag_visuals(view),
            None => (None, None),
        };

        Scene {
            width: self.config.width,
            height: self.config.height,
            dpr: self.dpr,
            item_size: self.config.item_size,
            elapsed_ms: self.started_ms.map_or(0.0, |start| now_ms - start),
            texture_seed: self.texture_seed,
            wind: self.wind.value(),
            items,
            selected: self.selected,
            particles: self.particles.particles().to_vec(),
            dragged,
            preview,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    #[must_use]
    pub fn garden(&self) -> &GardenController {
        &self.garden
    }

    #[must_use]
    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    #[must_use]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    #[must_use]
    pub fn selection(&self) -> Option<ItemId> {
        self.selected
    }

    #[must_use]
    pub fn wind(&self) -> Wind {
        self.wind
    }

    // --- Internals ---

    fn apply(&mut self, intent: Option<Intent>, now_ms: f64) -> Vec<Action> {
        let Some(intent) = intent else {
            return Vec::new();
        };
        tracing::debug!(?intent, "gesture intent");
        match intent {
            Intent::Select { item } => {
                self.selected = Some(item);
                vec![Action::SelectionChanged { item: Some(item) }]
            }
            Intent::Deselect => match self.selected.take() {
                Some(_) => vec![Action::SelectionChanged { item: None }],
                None => Vec::new(),
            },
            Intent::Place { kind, at } => match self.garden.place(&kind, at, now_ms) {
                Ok(pending) => vec![Action::Persist(pending), Action::InventoryChanged],
                Err(err) => vec![notice(&err)],
            },
            Intent::Move { item, at } => match self.garden.move_item(item, at) {
                Ok(Some(pending)) => vec![Action::Persist(pending)],
                Ok(None) => Vec::new(),
                Err(err) => vec![notice(&err)],
            },
            Intent::Return { item } => match self.garden.return_to_inventory(item) {
                Ok(pending) => {
                    let mut actions = vec![Action::Persist(pending), Action::InventoryChanged];
                    actions.extend(self.prune_selection());
                    actions
                }
                Err(err) => vec![notice(&err)],
            },
            Intent::Cancel => Vec::new(),
        }
    }

    /// Clear the selection if the selected item is gone.
    fn prune_selection(&mut self) -> Option<Action> {
        let id = self.selected?;
        if self.garden.doc().item(&id).is_some() {
            return None;
        }
        self.selected = None;
        Some(Action::SelectionChanged { item: None })
    }

    fn drag_visuals(&self, view: DragView) -> (Option<SceneItem>, Option<DragPreview>) {
        let DragView { source, at, over_garden } = view;
        match source {
            DragSource::Garden { item } => {
                let dragged = self.garden.doc().item(&item).and_then(|placed| self.scene_item(&placed.kind, Some(item), at, 1.0));
                let preview = over_garden.then(|| preview_at(at, None));
                (dragged, preview)
            }
            DragSource::Inventory { kind } => {
                let preview = over_garden.then(|| preview_at(at, self.scene_item(&kind, None, at, 1.0)));
                (None, preview)
            }
        }
    }

    fn placed_scene_item(&self, item: &PlacedItem, now_ms: f64) -> Option<SceneItem> {
        let pop = item
            .placed_at_ms
            .map_or(1.0, |placed_at| render::drop_scale(now_ms - placed_at, self.config.drop_animation_ms));
        self.scene_item(&item.kind, Some(item.id), item.pos(), pop)
    }

    fn scene_item(&self, kind: &str, id: Option<ItemId>, at: ItemPos, pop: f64) -> Option<SceneItem> {
        let entry = self.garden.catalog().get(kind)?;
        Some(SceneItem {
            id,
            kind: entry.name.clone(),
            emoji: entry.emoji_fallback.clone(),
            tint: entry.tint_color().to_owned(),
            asset_key: entry.asset_key.clone(),
            x: f64::from(at.x),
            y: f64::from(at.y),
            pop,
        })
    }
}

fn preview_at(at: ItemPos, ghost: Option<SceneItem>) -> DragPreview {
    DragPreview { x: f64::from(at.x), y: f64::from(at.y), ghost }
}

fn notice(err: &GardenError) -> Action {
    tracing::info!(error = %err, "operation refused or rolled back");
    Action::Notice { message: err.user_message() }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    assets: AssetCache<HtmlImageElement>,
    loader: ImageLoader,
    pub core: EngineCore,
}

impl Engine {
    /// Bind `core` to a canvas element.
    ///
    /// # Errors
    ///
    /// Fails if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, core: EngineCore) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let mut assets = AssetCache::new(core.config().asset_base_url.clone());
        let mut loader = ImageLoader::new();
        assets.prefetch(core.garden().catalog(), &mut loader);
        let mut engine = Self { canvas, ctx, assets, loader, core };
        engine.set_dpr(1.0);
        Ok(engine)
    }

    /// Size the backing store for `dpr` device pixels per CSS pixel.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_dpr(&mut self, dpr: f64) {
        self.core.set_dpr(dpr);
        let dpr = self.core.dpr;
        self.canvas.set_width((self.core.config.width * dpr).round() as u32);
        self.canvas.set_height((self.core.config.height * dpr).round() as u32);
    }

    // --- Render ---

    /// Draw the current state to the canvas. A failed frame is logged and
    /// the next one tries again.
    pub fn render(&mut self, now_ms: f64) {
        self.loader.drain_into(&mut self.assets);
        let scene = self.core.scene(now_ms);
        if let Err(e) = render::render_frame(&mut self.ctx, &scene, &self.assets) {
            tracing::warn!(error = ?e, "frame render failed");
        }
    }
}
