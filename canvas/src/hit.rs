//! Hit-testing: which placed item, inventory cell, or drop zone is under a
//! point.
//!
//! Zones are decided by geometric containment against the container
//! rectangles, never by DOM event target, so mouse and touch agree.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::{Deserialize, Serialize};

use crate::doc::PlacedItem;
use crate::geom::{Point, Rect};

/// Which container a client-space point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropZone {
    Garden,
    Inventory,
    Outside,
}

/// On-screen cell of one inventory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCell {
    pub kind: String,
    /// Client-space bounds.
    pub rect: Rect,
}

/// Client-space geometry of the drop targets, reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub garden: Rect,
    pub inventory: Rect,
    #[serde(default)]
    pub cells: Vec<InventoryCell>,
}

impl Layout {
    #[must_use]
    pub fn zone(&self, client: Point) -> DropZone {
        if self.garden.contains(client) {
            DropZone::Garden
        } else if self.inventory.contains(client) {
            DropZone::Inventory
        } else {
            DropZone::Outside
        }
    }

    /// Inventory cell under `client`, if any.
    #[must_use]
    pub fn cell_at(&self, client: Point) -> Option<&InventoryCell> {
        if !self.inventory.contains(client) {
            return None;
        }
        self.cells.iter().find(|c| c.rect.contains(client))
    }
}

/// Topmost placed item whose footprint `[x, x + size) x [y, y + size)`
/// contains `local` (garden-local).
#[must_use]
pub fn item_at(items: &[PlacedItem], local: Point, item_size: f64) -> Option<&PlacedItem> {
    items.iter().rev().find(|item| {
        Rect::new(f64::from(item.x), f64::from(item.y), item_size, item_size).covers(local)
    })
}
