//! Garden document model: placed items, inventory entries, and the store.
//!
//! `GardenDoc` is the canonical in-memory state owned by the garden
//! controller. The renderer reads it through `placed()`; only the controller
//! mutates it. Item order in `placed` is draw order (oldest first).

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::ItemPos;

/// Local identifier of a placed item. Assigned at creation, never changes.
pub type ItemId = Uuid;

/// Identifier of the garden owner.
pub type UserId = Uuid;

/// A decorative item located in the garden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    /// Catalog kind name.
    pub kind: String,
    /// Top-left x in garden-local pixels.
    pub x: i32,
    /// Top-left y in garden-local pixels.
    pub y: i32,
    /// Persistence-side id once creation has been confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<ItemId>,
    /// Bumped on every local position change; stale move responses compare against it.
    #[serde(default)]
    pub revision: u64,
    /// Host timestamp of placement, drives the drop-in animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_at_ms: Option<f64>,
}

impl PlacedItem {
    #[must_use]
    pub fn pos(&self) -> ItemPos {
        ItemPos::new(self.x, self.y)
    }

    /// Whether persistence has acknowledged this item's creation.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.remote_id.is_some()
    }
}

/// Owned-but-unplaced count of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub kind: String,
    pub quantity: u32,
}

impl InventoryEntry {
    /// Entries at zero stay listed but cannot start a drag.
    #[must_use]
    pub fn is_draggable(&self) -> bool {
        self.quantity > 0
    }
}

/// In-memory garden state for one user.
#[derive(Debug, Clone, Default)]
pub struct GardenDoc {
    placed: Vec<PlacedItem>,
    inventory: Vec<InventoryEntry>,
    currency: u64,
}

impl GardenDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly loaded snapshot.
    pub fn load(&mut self, placed: Vec<PlacedItem>, inventory: Vec<InventoryEntry>, currency: u64) {
        self.placed = placed;
        self.inventory = inventory;
        self.currency = currency;
    }

    // --- Placed items ---

    /// Placed items in draw order.
    #[must_use]
    pub fn placed(&self) -> &[PlacedItem] {
        &self.placed
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&PlacedItem> {
        self.placed.iter().find(|i| &i.id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut PlacedItem> {
        self.placed.iter_mut().find(|i| &i.id == id)
    }

    /// Append an item on top of the draw order.
    pub fn push_item(&mut self, item: PlacedItem) {
        self.placed.push(item);
    }

    /// Remove an item, returning it with its former draw index.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<(usize, PlacedItem)> {
        let idx = self.placed.iter().position(|i| &i.id == id)?;
        Some((idx, self.placed.remove(idx)))
    }

    /// Put a removed item back at (or as close as possible to) its old index.
    pub fn reinstate_item(&mut self, index: usize, item: PlacedItem) {
        let index = index.min(self.placed.len());
        self.placed.insert(index, item);
    }

    /// Most recently placed item of `kind`, if any.
    #[must_use]
    pub fn latest_of_kind(&self, kind: &str) -> Option<&PlacedItem> {
        self.placed.iter().rev().find(|i| i.kind == kind)
    }

    #[must_use]
    pub fn placed_count(&self, kind: &str) -> usize {
        self.placed.iter().filter(|i| i.kind == kind).count()
    }

    // --- Inventory ---

    /// Inventory entries in display order.
    #[must_use]
    pub fn inventory(&self) -> &[InventoryEntry] {
        &self.inventory
    }

    #[must_use]
    pub fn entry(&self, kind: &str) -> Option<&InventoryEntry> {
        self.inventory.iter().find(|e| e.kind == kind)
    }

    /// Quantity of `kind` in inventory (0 if there is no entry).
    #[must_use]
    pub fn quantity(&self, kind: &str) -> u32 {
        self.entry(kind).map_or(0, |e| e.quantity)
    }

    /// Whether one more `kind` fits in inventory.
    #[must_use]
    pub fn has_room(&self, kind: &str) -> bool {
        self.quantity(kind) < u32::MAX
    }

    /// Increment `kind`, creating the entry if needed. Returns the new
    /// quantity, or `None` (and changes nothing) when the count is full.
    #[must_use]
    pub fn add_one(&mut self, kind: &str) -> Option<u32> {
        if let Some(entry) = self.inventory.iter_mut().find(|e| e.kind == kind) {
            entry.quantity = entry.quantity.checked_add(1)?;
            return Some(entry.quantity);
        }
        self.inventory.push(InventoryEntry { kind: kind.to_owned(), quantity: 1 });
        Some(1)
    }

    /// Decrement `kind` if it is above zero. Returns the new quantity, or
    /// `None` when there was nothing to take.
    pub fn take_one(&mut self, kind: &str) -> Option<u32> {
        let entry = self.inventory.iter_mut().find(|e| e.kind == kind)?;
        if entry.quantity == 0 {
            return None;
        }
        entry.quantity -= 1;
        Some(entry.quantity)
    }

    /// Placed count plus inventory quantity for `kind`.
    #[must_use]
    pub fn total(&self, kind: &str) -> u64 {
        self.placed_count(kind) as u64 + u64::from(self.quantity(kind))
    }

    // --- Currency ---

    #[must_use]
    pub fn currency(&self) -> u64 {
        self.currency
    }

    pub fn set_currency(&mut self, amount: u64) {
        self.currency = amount;
    }
}
