//! Gesture/drag controller: mouse, touch and native drag-and-drop folded
//! into one press-move-release lifecycle.
//!
//! DESIGN
//! ======
//! `Idle -> Pressed -> Dragging -> Idle`. A press on a placed item or a
//! non-empty inventory cell opens a [`DragSession`]; travelling further than
//! the tap slop promotes it to a drag. Release is classified by which
//! container rectangle the pointer is in, and produces exactly one terminal
//! [`Intent`]. The controller never mutates garden state itself: the engine
//! forwards intents to the garden controller.
//!
//! Only one pointer is tracked. While a gesture is active, events from any
//! other pointer (a second finger, a stray mouse) are ignored.
//!
//! A garden-sourced drag never moves the real item. The engine draws it at
//! [`DragView::at`] instead, so cancelling needs no revert.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use serde::Serialize;

use crate::doc::{GardenDoc, ItemId};
use crate::geom::{Bounds, ItemPos, Point};
use crate::hit::{self, DropZone, Layout};
use crate::input::{DragPayload, DragSession, DragSource, PointerId};

/// Terminal outcome of a gesture, forwarded to the garden controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Tap on a placed item.
    Select { item: ItemId },
    /// Tap on empty garden.
    Deselect,
    /// Inventory unit dropped on the garden. `at` is the unclamped top-left.
    Place { kind: String, at: Point },
    /// Placed item dropped elsewhere in the garden.
    Move { item: ItemId, at: Point },
    /// Placed item dropped on the inventory.
    Return { item: ItemId },
    /// Released outside any valid target, aborted, or malformed.
    Cancel,
}

/// Gesture state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    /// No pointer is down.
    #[default]
    Idle,
    /// Pointer down on a draggable, still within the tap slop.
    Pressed { pointer: PointerId, session: DragSession },
    /// Pointer travelled past the slop, or a native drag started.
    Dragging { pointer: PointerId, session: DragSession },
}

impl GestureState {
    fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::Idle => None,
            Self::Pressed { pointer, .. } | Self::Dragging { pointer, .. } => Some(*pointer),
        }
    }
}

/// What the renderer needs to show an in-progress drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragView {
    pub source: DragSource,
    /// Prospective top-left in garden-local space, already clamped.
    pub at: ItemPos,
    /// Whether releasing now would land in the garden.
    pub over_garden: bool,
}

pub struct GestureController {
    state: GestureState,
    layout: Layout,
    bounds: Bounds,
    tap_slop: f64,
}

impl GestureController {
    #[must_use]
    pub fn new(bounds: Bounds, tap_slop: f64) -> Self {
        Self { state: GestureState::Idle, layout: Layout::default(), bounds, tap_slop }
    }

    // --- Geometry ---

    /// Replace the client-space container geometry. Called by the host on
    /// resize, scroll or inventory re-layout.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            GestureState::Idle => None,
            GestureState::Pressed { session, .. } | GestureState::Dragging { session, .. } => Some(session),
        }
    }

    /// Drag visuals for the current frame; `None` unless dragging.
    #[must_use]
    pub fn drag_view(&self) -> Option<DragView> {
        let GestureState::Dragging { session, .. } = &self.state else {
            return None;
        };
        Some(DragView {
            source: session.source.clone(),
            at: self.bounds.clamp(self.drop_origin(session)),
            over_garden: self.layout.zone(session.pointer) == DropZone::Garden,
        })
    }

    // --- Pointer lifecycle ---

    /// Pointer or first touch went down at `client`.
    ///
    /// Returns [`Intent::Deselect`] for a press on empty garden; every other
    /// press either opens a session or is ignored.
    pub fn pointer_down(&mut self, pointer: PointerId, client: Point, doc: &GardenDoc) -> Option<Intent> {
        if !self.is_idle() {
            tracing::trace!(?pointer, "ignoring pointer while a gesture is active");
            return None;
        }
        if !client.is_finite() {
            return None;
        }
        let session = match self.layout.zone(client) {
            DropZone::Garden => {
                let local = self.layout.garden.to_local(client);
                let Some(item) = hit::item_at(doc.placed(), local, self.bounds.item_size) else {
                    return Some(Intent::Deselect);
                };
                let offset = local.sub(item.pos().to_point());
                DragSession::new(DragSource::Garden { item: item.id }, offset, client)
            }
            DropZone::Inventory => {
                let cell = self.layout.cell_at(client)?;
                if doc.quantity(&cell.kind) == 0 {
                    return None;
                }
                DragSession::new(DragSource::Inventory { kind: cell.kind.clone() }, self.centered(), client)
            }
            DropZone::Outside => return None,
        };
        self.state = GestureState::Pressed { pointer, session };
        None
    }

    /// Pointer moved. Returns whether the tracked gesture was updated.
    pub fn pointer_move(&mut self, pointer: PointerId, client: Point) -> bool {
        if !client.is_finite() || self.state.pointer() != Some(pointer) {
            return false;
        }
        self.state = match std::mem::take(&mut self.state) {
            GestureState::Pressed { pointer, mut session } => {
                session.pointer = client;
                if session.travel() > self.tap_slop {
                    GestureState::Dragging { pointer, session }
                } else {
                    GestureState::Pressed { pointer, session }
                }
            }
            GestureState::Dragging { pointer, mut session } => {
                session.pointer = client;
                GestureState::Dragging { pointer, session }
            }
            GestureState::Idle => GestureState::Idle,
        };
        true
    }

    /// Pointer released. `None` when `pointer` is not the tracked one.
    pub fn pointer_up(&mut self, pointer: PointerId, client: Point) -> Option<Intent> {
        if self.state.pointer() != Some(pointer) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            GestureState::Idle => None,
            GestureState::Pressed { mut session, .. } => {
                if client.is_finite() {
                    session.pointer = client;
                }
                if session.travel() > self.tap_slop {
                    return Some(self.release(session));
                }
                Some(match session.source {
                    DragSource::Garden { item } => Intent::Select { item },
                    DragSource::Inventory { .. } => Intent::Cancel,
                })
            }
            GestureState::Dragging { mut session, .. } => {
                if client.is_finite() {
                    session.pointer = client;
                }
                Some(self.release(session))
            }
        }
    }

    /// Abort whatever is in progress (`pointercancel`, `touchcancel`, Escape).
    pub fn cancel(&mut self) -> Option<Intent> {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => None,
            _ => Some(Intent::Cancel),
        }
    }

    // --- Native drag-and-drop ---

    /// `dragstart` with the transfer data the source element set.
    ///
    /// Takes over from a mouse press (the browser stops sending mouse events
    /// once a native drag starts) but never from an active touch gesture.
    pub fn native_start(&mut self, raw: &str, client: Point, doc: &GardenDoc) -> Option<Intent> {
        if matches!(self.state.pointer(), Some(PointerId::Touch(_))) {
            return None;
        }
        self.state = GestureState::Idle;
        let Some(source) = self.validated(raw, doc) else {
            return Some(Intent::Cancel);
        };
        let offset = self.offset_for(&source, client, doc);
        let start = if client.is_finite() { client } else { Point::default() };
        self.state = GestureState::Dragging { pointer: PointerId::Native, session: DragSession::new(source, offset, start) };
        None
    }

    /// `dragover`: track the pointer.
    pub fn native_over(&mut self, client: Point) -> bool {
        self.pointer_move(PointerId::Native, client)
    }

    /// `drop`. The payload delivered with the drop is authoritative; the
    /// session (if one was started) only contributes the pointer offset.
    pub fn native_drop(&mut self, raw: &str, client: Point, doc: &GardenDoc) -> Intent {
        let previous = match std::mem::take(&mut self.state) {
            GestureState::Dragging { pointer: PointerId::Native, session } => Some(session),
            other @ (GestureState::Pressed { .. } | GestureState::Dragging { .. }) => {
                // A touch gesture keeps running; a native drop cannot end it.
                self.state = other;
                None
            }
            GestureState::Idle => None,
        };
        let Some(source) = self.validated(raw, doc) else {
            return Intent::Cancel;
        };
        if !client.is_finite() {
            return Intent::Cancel;
        }
        let offset = match previous {
            Some(session) if session.source == source => session.offset,
            _ => self.offset_for(&source, client, doc),
        };
        self.release(DragSession::new(source, offset, client))
    }

    /// `dragend`: if no drop consumed the session, it was cancelled.
    pub fn native_end(&mut self) -> Option<Intent> {
        if self.state.pointer() == Some(PointerId::Native) {
            return self.cancel();
        }
        None
    }

    // --- Internals ---

    fn release(&self, session: DragSession) -> Intent {
        let at = self.drop_origin(&session);
        match (self.layout.zone(session.pointer), session.source) {
            (DropZone::Garden, DragSource::Inventory { kind }) => Intent::Place { kind, at },
            (DropZone::Garden, DragSource::Garden { item }) => Intent::Move { item, at },
            (DropZone::Inventory, DragSource::Garden { item }) => Intent::Return { item },
            _ => Intent::Cancel,
        }
    }

    /// Unclamped top-left in garden-local space: pointer minus offset.
    fn drop_origin(&self, session: &DragSession) -> Point {
        self.layout.garden.to_local(session.pointer).sub(session.offset)
    }

    fn centered(&self) -> Point {
        let half = self.bounds.item_size / 2.0;
        Point::new(half, half)
    }

    fn offset_for(&self, source: &DragSource, client: Point, doc: &GardenDoc) -> Point {
        if let DragSource::Garden { item } = source {
            if let Some(item) = doc.item(item) {
                if self.layout.garden.contains(client) {
                    return self.layout.garden.to_local(client).sub(item.pos().to_point());
                }
            }
        }
        self.centered()
    }

    fn validated(&self, raw: &str, doc: &GardenDoc) -> Option<DragSource> {
        let source = match DragPayload::parse(raw) {
            Ok(payload) => payload.into_source(),
            Err(e) => {
                tracing::debug!(error = %e, "malformed drag payload");
                return None;
            }
        };
        let valid = match &source {
            DragSource::Inventory { kind } => doc.quantity(kind) > 0,
            DragSource::Garden { item } => doc.item(item).is_some(),
        };
        if !valid {
            tracing::debug!(?source, "drag payload names nothing draggable");
            return None;
        }
        Some(source)
    }
}
