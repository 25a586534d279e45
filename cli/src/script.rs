//! Replay scripts: a fixture garden plus a list of input steps, driven
//! through `EngineCore` against an in-memory persistence service.
//!
//! A script file is either a bare JSON array of steps or an object:
//!
//! ```json
//! {
//!   "layout": { "garden": {...}, "inventory": {...}, "cells": [...] },
//!   "garden": { "currency": 500, "inventory": [...], "items": [...] },
//!   "steps": [ { "step": "pointer_down", "x": 10, "y": 10 }, ... ]
//! }
//! ```
//!
//! Every `Action::Persist` produced along the way is executed immediately
//! and settled before the next step, follow-ups included.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use std::collections::VecDeque;

use garden_canvas::catalog::Catalog;
use garden_canvas::config::GardenConfig;
use garden_canvas::doc::{InventoryEntry, ItemId, PlacedItem, UserId};
use garden_canvas::engine::{Action, EngineCore};
use garden_canvas::geom::{Point, Rect};
use garden_canvas::hit::Layout;
use garden_canvas::input::TouchPoint;
use garden_canvas::persist::memory::MemoryStore;
use garden_canvas::persist::{self, ItemRecord, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CliError;

/// One scripted input event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        at_ms: f64,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        at_ms: f64,
    },
    TouchStart {
        touches: Vec<TouchPoint>,
        #[serde(default)]
        at_ms: f64,
    },
    TouchMove {
        touches: Vec<TouchPoint>,
    },
    TouchEnd {
        touches: Vec<TouchPoint>,
        #[serde(default)]
        at_ms: f64,
    },
    Cancel,
    /// `payload` is either the raw string or the payload object itself.
    NativeDragStart {
        payload: Value,
        x: f64,
        y: f64,
    },
    NativeDragOver {
        x: f64,
        y: f64,
    },
    NativeDrop {
        payload: Value,
        x: f64,
        y: f64,
        #[serde(default)]
        at_ms: f64,
    },
    NativeDragEnd,
    Purchase {
        kind: String,
    },
    Tick {
        at_ms: f64,
    },
    /// Clear every injected persistence failure.
    Heal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureItem {
    pub kind: String,
    pub x: i32,
    pub y: i32,
}

/// Server-side state the replay starts from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub currency: u64,
    pub inventory: Vec<InventoryEntry>,
    pub items: Vec<FixtureItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub garden: Fixture,
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Steps(Vec<Step>),
    Full(Script),
}

impl Script {
    /// Parse a script file body.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Script`] if the body is neither form.
    pub fn parse(raw: &str) -> Result<Self, CliError> {
        let file: ScriptFile = serde_json::from_str(raw).map_err(CliError::Script)?;
        Ok(match file {
            ScriptFile::Steps(steps) => Self { steps, ..Self::default() },
            ScriptFile::Full(script) => script,
        })
    }

    /// The scripted layout, or the garden at the client origin with no
    /// inventory strip.
    #[must_use]
    pub fn layout_for(&self, config: &GardenConfig) -> Layout {
        self.layout.clone().unwrap_or_else(|| Layout {
            garden: Rect::new(0.0, 0.0, config.width, config.height),
            ..Layout::default()
        })
    }
}

fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Final state printed by `garden replay`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub currency: u64,
    pub inventory: &'a [InventoryEntry],
    pub placed: &'a [PlacedItem],
    pub selection: Option<ItemId>,
    pub in_flight: usize,
    pub notices: &'a [String],
    pub persisted: Persisted,
}

/// What the in-memory service holds after the replay.
#[derive(Debug, Serialize)]
pub struct Persisted {
    pub currency: u64,
    pub items: Vec<ItemRecord>,
    pub inventory: Vec<InventoryEntry>,
}

pub struct Replay {
    core: EngineCore,
    store: MemoryStore,
    user: UserId,
    notices: Vec<String>,
}

impl Replay {
    /// Seed the store from the fixture, load it into a fresh engine, then
    /// arm the requested failures.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for an invalid config and
    /// [`CliError::Load`] if the initial listing fails.
    pub async fn start(
        script: &Script,
        catalog: Catalog,
        config: GardenConfig,
        seed: u64,
        failing: &[Operation],
    ) -> Result<Self, CliError> {
        let user = UserId::nil();
        let store = MemoryStore::new();
        store.seed_currency(user, script.garden.currency);
        for entry in &script.garden.inventory {
            store.seed_inventory(user, &entry.kind, entry.quantity);
        }
        for item in &script.garden.items {
            store.seed_item(user, &item.kind, item.x, item.y);
        }

        let layout = script.layout_for(&config);
        let mut core = EngineCore::new(user, catalog, config, seed)?;
        core.set_layout(layout);

        let (items, inventory) = persist::load_garden(&store, user).await?;
        core.hydrate(items, inventory, store.currency_of(user));
        for op in failing {
            store.fail(*op);
        }
        tracing::info!(user = %user, placed = core.garden().placed().len(), ?failing, "replay started");

        Ok(Self { core, store, user, notices: Vec::new() })
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Apply every step in order.
    pub async fn run(&mut self, steps: &[Step]) {
        for (index, step) in steps.iter().enumerate() {
            tracing::debug!(index, ?step, "step");
            let actions = self.apply(step);
            self.dispatch(actions).await;
        }
    }

    fn apply(&mut self, step: &Step) -> Vec<Action> {
        let core = &mut self.core;
        match step {
            Step::PointerDown { x, y, at_ms } => core.on_pointer_down(Point::new(*x, *y), *at_ms),
            Step::PointerMove { x, y } => {
                core.on_pointer_move(Point::new(*x, *y));
                Vec::new()
            }
            Step::PointerUp { x, y, at_ms } => core.on_pointer_up(Point::new(*x, *y), *at_ms),
            Step::TouchStart { touches, at_ms } => core.on_touch_start(touches, *at_ms),
            Step::TouchMove { touches } => {
                core.on_touch_move(touches);
                Vec::new()
            }
            Step::TouchEnd { touches, at_ms } => core.on_touch_end(touches, *at_ms),
            Step::Cancel => core.on_cancel(),
            Step::NativeDragStart { payload, x, y } => {
                core.on_native_drag_start(&payload_text(payload), Point::new(*x, *y))
            }
            Step::NativeDragOver { x, y } => {
                core.on_native_drag_over(Point::new(*x, *y));
                Vec::new()
            }
            Step::NativeDrop { payload, x, y, at_ms } => {
                core.on_native_drop(&payload_text(payload), Point::new(*x, *y), *at_ms)
            }
            Step::NativeDragEnd => core.on_native_drag_end(),
            Step::Purchase { kind } => core.purchase(kind),
            Step::Tick { at_ms } => {
                core.tick(*at_ms);
                Vec::new()
            }
            Step::Heal => {
                self.store.heal_all();
                Vec::new()
            }
        }
    }

    async fn dispatch(&mut self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::Persist(pending) => {
                    let op = pending.op;
                    let settlement = persist::execute(&self.store, self.user, pending).await;
                    tracing::debug!(%op, ok = settlement.all_ok(), "settled");
                    queue.extend(self.core.settle(settlement));
                }
                Action::Notice { message } => {
                    tracing::info!(%message, "notice");
                    self.notices.push(message);
                }
                Action::SelectionChanged { .. } | Action::InventoryChanged => {}
            }
        }
    }

    #[must_use]
    pub fn report(&self) -> Report<'_> {
        let garden = self.core.garden();
        let inventory = garden
            .catalog()
            .iter()
            .map(|kind| InventoryEntry {
                kind: kind.name.clone(),
                quantity: self.store.quantity_of(self.user, &kind.name),
            })
            .filter(|entry| entry.quantity > 0)
            .collect();
        Report {
            currency: garden.currency(),
            inventory: garden.inventory(),
            placed: garden.placed(),
            selection: self.core.selection(),
            in_flight: garden.in_flight(),
            notices: &self.notices,
            persisted: Persisted {
                currency: self.store.currency_of(self.user),
                items: self.store.items_of(self.user),
                inventory,
            },
        }
    }
}
