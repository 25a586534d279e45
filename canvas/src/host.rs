//! Browser host: DOM event wiring, the animation loop, and persistence
//! dispatch for one garden canvas.
//!
//! DESIGN
//! ======
//! `GardenHost` is the only type JavaScript sees. Pointer, touch and native
//! drag events are listened for on `window` and handed to the engine in
//! client coordinates; the engine decides which container they belong to
//! from the layout the page reports through `set_layout`. Every
//! [`Action::Persist`] is run with `spawn_local` and its settlement fed back
//! into the engine, which may produce follow-up writes. Every other action
//! is serialized to JSON and passed to the page's `on_action` callback.
//!
//! Inventory cells start native drags by carrying a `data-drag-payload`
//! attribute holding a [`crate::input::DragPayload`] JSON document.
//!
//! ERROR HANDLING
//! ==============
//! Construction errors are returned to JavaScript. After that nothing
//! propagates: failed listeners, callbacks and frames are logged.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use uuid::Uuid;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, DragEvent, Element, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

use crate::catalog::Catalog;
use crate::config::GardenConfig;
use crate::engine::{Action, Engine, EngineCore};
use crate::geom::Point;
use crate::hit::Layout;
use crate::input::TouchPoint;
use crate::persist::http::HttpStore;
use crate::persist::{self, PersistenceService};

const PAYLOAD_ATTR: &str = "data-drag-payload";
const PAYLOAD_MIME: &str = "application/json";

type Listener = (web_sys::EventTarget, &'static str, Closure<dyn FnMut(Event)>);

struct Shared {
    engine: RefCell<Engine>,
    store: HttpStore,
    user: Uuid,
    on_action: RefCell<Option<js_sys::Function>>,
    listeners: RefCell<Vec<Listener>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    running: Cell<bool>,
}

#[wasm_bindgen]
pub struct GardenHost {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl GardenHost {
    /// Create a host for `canvas`.
    ///
    /// `config_json` may be empty for defaults; `catalog_json` falls back to
    /// the bundled shop catalog.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        user_id: &str,
        api_base: &str,
        config_json: &str,
        catalog_json: Option<String>,
    ) -> Result<GardenHost, JsValue> {
        console_error_panic_hook::set_once();
        let user = Uuid::parse_str(user_id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let config = if config_json.trim().is_empty() {
            GardenConfig::default()
        } else {
            GardenConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let catalog = match catalog_json {
            Some(raw) => Catalog::from_json(&raw),
            None => Catalog::bundled(),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let core = EngineCore::new(user, catalog, config, random_seed()).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut engine = Engine::new(canvas, core)?;
        if let Some(window) = web_sys::window() {
            engine.set_dpr(window.device_pixel_ratio());
        }
        tracing::info!(user = %user, api_base, "garden host created");
        Ok(Self {
            shared: Rc::new(Shared {
                engine: RefCell::new(engine),
                store: HttpStore::new(api_base),
                user,
                on_action: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                frame: RefCell::new(None),
                running: Cell::new(false),
            }),
        })
    }

    /// Register the callback that receives every non-persistence action as a
    /// JSON string.
    pub fn on_action(&self, callback: js_sys::Function) {
        *self.shared.on_action.borrow_mut() = Some(callback);
    }

    /// Report container geometry (`hit::Layout` as JSON, client space).
    pub fn set_layout(&self, layout_json: &str) -> Result<(), JsValue> {
        let layout: Layout = serde_json::from_str(layout_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.shared.engine.borrow_mut().core.set_layout(layout);
        Ok(())
    }

    pub fn set_device_pixel_ratio(&self, dpr: f64) {
        self.shared.engine.borrow_mut().set_dpr(dpr);
    }

    /// Fetch placed items and inventory, then replace local state.
    pub fn load(&self, currency: f64) {
        let shared = Rc::clone(&self.shared);
        wasm_bindgen_futures::spawn_local(async move {
            match persist::load_garden(&shared.store, shared.user).await {
                Ok((items, inventory)) => {
                    let actions = shared.engine.borrow_mut().core.hydrate(items, inventory, coins(currency));
                    dispatch(&shared, actions);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "garden load failed");
                    notify(&shared, &Action::Notice { message: "Could not load your garden.".into() });
                }
            }
        });
    }

    pub fn purchase(&self, kind: &str) {
        let actions = self.shared.engine.borrow_mut().core.purchase(kind);
        dispatch(&self.shared, actions);
    }

    /// Attach event listeners and start the animation loop.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.shared.running.replace(true) {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        attach_listeners(&self.shared, &window)?;
        start_frames(&self.shared, &window)
    }

    /// Detach listeners and stop the animation loop.
    pub fn stop(&self) {
        self.shared.running.set(false);
        for (target, name, closure) in self.shared.listeners.borrow_mut().drain(..) {
            if let Err(e) = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                tracing::warn!(error = ?e, event = name, "could not remove listener");
            }
        }
        self.shared.frame.borrow_mut().take();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn random_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coins(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 { amount as u64 } else { 0 }
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

// =============================================================
// Actions
// =============================================================

fn dispatch(shared: &Rc<Shared>, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Persist(pending) => {
                let shared = Rc::clone(shared);
                wasm_bindgen_futures::spawn_local(async move {
                    let service: &dyn PersistenceService = &shared.store;
                    let settlement = persist::execute(service, shared.user, pending).await;
                    let next = shared.engine.borrow_mut().core.settle(settlement);
                    dispatch(&shared, next);
                });
            }
            other => notify(shared, &other),
        }
    }
}

fn notify(shared: &Shared, action: &Action) {
    let Some(callback) = shared.on_action.borrow().clone() else {
        return;
    };
    let json = match serde_json::to_string(action) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "could not encode action");
            return;
        }
    };
    if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
        tracing::warn!(error = ?e, "on_action callback threw");
    }
}

// =============================================================
// Animation loop
// =============================================================

fn start_frames(shared: &Rc<Shared>, window: &web_sys::Window) -> Result<(), JsValue> {
    let weak: Weak<Shared> = Rc::downgrade(shared);
    let closure = Closure::<dyn FnMut(f64)>::new(move |_ts: f64| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if !shared.running.get() {
            return;
        }
        {
            let mut engine = shared.engine.borrow_mut();
            let now = now_ms();
            engine.core.tick(now);
            engine.render(now);
        }
        request_frame(&shared);
    });
    window.request_animation_frame(closure.as_ref().unchecked_ref())?;
    *shared.frame.borrow_mut() = Some(closure);
    Ok(())
}

fn request_frame(shared: &Shared) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Some(closure) = shared.frame.borrow().as_ref() {
        if let Err(e) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            tracing::warn!(error = ?e, "requestAnimationFrame failed, animation stopped");
        }
    }
}

// =============================================================
// Events
// =============================================================

fn client_point(ev: &MouseEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

fn changed_touches(ev: &TouchEvent) -> Vec<TouchPoint> {
    let list = ev.changed_touches();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| TouchPoint { id: t.identifier(), client: Point::new(f64::from(t.client_x()), f64::from(t.client_y())) })
        .collect()
}

/// Payload attribute of the element a native drag started on.
fn drag_source_payload(ev: &Event) -> Option<String> {
    let Ok(element) = ev.target()?.dyn_into::<Element>() else {
        return None;
    };
    match element.closest(&format!("[{PAYLOAD_ATTR}]")) {
        Ok(Some(source)) => source.get_attribute(PAYLOAD_ATTR),
        _ => None,
    }
}

fn listen(
    shared: &Rc<Shared>,
    target: &web_sys::EventTarget,
    name: &'static str,
    handler: impl Fn(&Rc<Shared>, Event) + 'static,
) -> Result<(), JsValue> {
    let weak = Rc::downgrade(shared);
    let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
        if let Some(shared) = weak.upgrade() {
            handler(&shared, ev);
        }
    });
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        name,
        closure.as_ref().unchecked_ref(),
        &options,
    )?;
    shared.listeners.borrow_mut().push((target.clone(), name, closure));
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn attach_listeners(shared: &Rc<Shared>, window: &web_sys::Window) -> Result<(), JsValue> {
    let target: &web_sys::EventTarget = window.as_ref();

    listen(shared, target, "mousedown", |shared, ev| {
        let Some(ev) = ev.dyn_ref::<MouseEvent>() else { return };
        if ev.button() != 0 {
            return;
        }
        let actions = shared.engine.borrow_mut().core.on_pointer_down(client_point(ev), now_ms());
        dispatch(shared, actions);
    })?;

    listen(shared, target, "mousemove", |shared, ev| {
        if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
            shared.engine.borrow_mut().core.on_pointer_move(client_point(ev));
        }
    })?;

    listen(shared, target, "mouseup", |shared, ev| {
        let Some(ev) = ev.dyn_ref::<MouseEvent>() else { return };
        let actions = shared.engine.borrow_mut().core.on_pointer_up(client_point(ev), now_ms());
        dispatch(shared, actions);
    })?;

    listen(shared, target, "touchstart", |shared, ev| {
        let Some(ev) = ev.dyn_ref::<TouchEvent>() else { return };
        let actions = shared.engine.borrow_mut().core.on_touch_start(&changed_touches(ev), now_ms());
        dispatch(shared, actions);
    })?;

    listen(shared, target, "touchmove", |shared, ev| {
        let Some(touch) = ev.dyn_ref::<TouchEvent>() else { return };
        let mut engine = shared.engine.borrow_mut();
        if !engine.core.gesture().is_idle() {
            // Keep the page from scrolling under an active drag.
            ev.prevent_default();
        }
        engine.core.on_touch_move(&changed_touches(touch));
    })?;

    listen(shared, target, "touchend", |shared, ev| {
        let Some(ev) = ev.dyn_ref::<TouchEvent>() else { return };
        let actions = shared.engine.borrow_mut().core.on_touch_end(&changed_touches(ev), now_ms());
        dispatch(shared, actions);
    })?;

    listen(shared, target, "touchcancel", |shared, _ev| {
        let actions = shared.engine.borrow_mut().core.on_cancel();
        dispatch(shared, actions);
    })?;

    listen(shared, target, "keydown", |shared, ev| {
        let Some(ev) = ev.dyn_ref::<KeyboardEvent>() else { return };
        if ev.key() == "Escape" {
            let actions = shared.engine.borrow_mut().core.on_cancel();
            dispatch(shared, actions);
        }
    })?;

    listen(shared, target, "dragstart", |shared, ev| {
        let Some(payload) = drag_source_payload(&ev) else { return };
        let Some(drag) = ev.dyn_ref::<DragEvent>() else { return };
        if let Some(transfer) = drag.data_transfer() {
            if let Err(e) = transfer.set_data(PAYLOAD_MIME, &payload) {
                tracing::debug!(error = ?e, "could not set drag payload");
            }
        }
        let actions = shared.engine.borrow_mut().core.on_native_drag_start(&payload, client_point(drag));
        dispatch(shared, actions);
    })?;

    listen(shared, target, "dragover", |shared, ev| {
        let Some(drag) = ev.dyn_ref::<DragEvent>() else { return };
        // Accepting the drop requires cancelling dragover.
        ev.prevent_default();
        shared.engine.borrow_mut().core.on_native_drag_over(client_point(drag));
    })?;

    listen(shared, target, "drop", |shared, ev| {
        let Some(drag) = ev.dyn_ref::<DragEvent>() else { return };
        ev.prevent_default();
        let payload = match drag.data_transfer().map(|t| t.get_data(PAYLOAD_MIME)) {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => {
                tracing::debug!(error = ?e, "drop without readable payload");
                String::new()
            }
            None => String::new(),
        };
        let actions = shared.engine.borrow_mut().core.on_native_drop(&payload, client_point(drag), now_ms());
        dispatch(shared, actions);
    })?;

    listen(shared, target, "dragend", |shared, _ev| {
        let actions = shared.engine.borrow_mut().core.on_native_drag_end();
        dispatch(shared, actions);
    })?;

    Ok(())
}
