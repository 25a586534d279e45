//! In-memory [`PersistenceService`] with per-operation failure injection.
//!
//! Used by the CLI replay driver and by the reconciliation tests. State lives
//! behind a `RefCell`: the service contract is single-threaded (`?Send`).

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use uuid::Uuid;

use super::{ItemRecord, Operation, PersistError, PersistenceService};
use crate::doc::{InventoryEntry, ItemId, UserId};

#[derive(Debug, Default)]
struct State {
    items: Vec<(UserId, ItemRecord)>,
    inventory: HashMap<(UserId, String), u32>,
    currency: HashMap<UserId, u64>,
    failing: HashSet<Operation>,
    fail_once: HashSet<Operation>,
    calls: Vec<Operation>,
}

impl State {
    fn enter(&mut self, op: Operation) -> Result<(), PersistError> {
        self.calls.push(op);
        if self.failing.contains(&op) || self.fail_once.remove(&op) {
            return Err(PersistError::Unavailable(op));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail until [`MemoryStore::heal`].
    pub fn fail(&self, op: Operation) {
        self.state.borrow_mut().failing.insert(op);
    }

    /// Make only the next call of `op` fail.
    pub fn fail_next(&self, op: Operation) {
        self.state.borrow_mut().fail_once.insert(op);
    }

    pub fn heal(&self, op: Operation) {
        let mut state = self.state.borrow_mut();
        state.failing.remove(&op);
        state.fail_once.remove(&op);
    }

    pub fn heal_all(&self) {
        let mut state = self.state.borrow_mut();
        state.failing.clear();
        state.fail_once.clear();
    }

    /// Seed a user's inventory quantity.
    pub fn seed_inventory(&self, user: UserId, kind: &str, quantity: u32) {
        self.state.borrow_mut().inventory.insert((user, kind.to_owned()), quantity);
    }

    /// Seed a placed item row and return it.
    pub fn seed_item(&self, user: UserId, kind: &str, x: i32, y: i32) -> ItemRecord {
        let record = ItemRecord { id: Uuid::new_v4(), kind: kind.to_owned(), x, y };
        self.state.borrow_mut().items.push((user, record.clone()));
        record
    }

    pub fn seed_currency(&self, user: UserId, amount: u64) {
        self.state.borrow_mut().currency.insert(user, amount);
    }

    /// Every operation attempted so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.state.borrow().calls.clone()
    }

    /// Stored rows of a user, in creation order.
    #[must_use]
    pub fn items_of(&self, user: UserId) -> Vec<ItemRecord> {
        self.state
            .borrow()
            .items
            .iter()
            .filter(|(owner, _)| *owner == user)
            .map(|(_, r)| r.clone())
            .collect()
    }

    #[must_use]
    pub fn quantity_of(&self, user: UserId, kind: &str) -> u32 {
        self.state
            .borrow()
            .inventory
            .get(&(user, kind.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn currency_of(&self, user: UserId) -> u64 {
        self.state.borrow().currency.get(&user).copied().unwrap_or(0)
    }
}

#[async_trait(?Send)]
impl PersistenceService for MemoryStore {
    async fn create_placed_item(&self, user: UserId, kind: &str, x: i32, y: i32) -> Result<ItemRecord, PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::CreateItem)?;
        let record = ItemRecord { id: Uuid::new_v4(), kind: kind.to_owned(), x, y };
        state.items.push((user, record.clone()));
        Ok(record)
    }

    async fn update_placed_item_position(&self, item: ItemId, x: i32, y: i32) -> Result<ItemRecord, PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::UpdatePosition)?;
        let (_, record) = state
            .items
            .iter_mut()
            .find(|(_, r)| r.id == item)
            .ok_or(PersistError::NotFound(item))?;
        record.x = x;
        record.y = y;
        Ok(record.clone())
    }

    async fn delete_placed_item(&self, item: ItemId) -> Result<(), PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::DeleteItem)?;
        let idx = state
            .items
            .iter()
            .position(|(_, r)| r.id == item)
            .ok_or(PersistError::NotFound(item))?;
        state.items.remove(idx);
        Ok(())
    }

    async fn list_placed_items(&self, user: UserId) -> Result<Vec<ItemRecord>, PersistError> {
        self.state.borrow_mut().enter(Operation::ListItems)?;
        Ok(self.items_of(user))
    }

    async fn adjust_inventory_quantity(
        &self,
        user: UserId,
        kind: &str,
        quantity: u32,
    ) -> Result<InventoryEntry, PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::SetQuantity)?;
        state.inventory.insert((user, kind.to_owned()), quantity);
        Ok(InventoryEntry { kind: kind.to_owned(), quantity })
    }

    async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryEntry>, PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::ListInventory)?;
        let mut entries: Vec<InventoryEntry> = state
            .inventory
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|((_, kind), qty)| InventoryEntry { kind: kind.clone(), quantity: *qty })
            .collect();
        entries.sort_by(|a, b| a.kind.cmp(&b.kind));
        Ok(entries)
    }

    async fn adjust_user_currency(&self, user: UserId, amount: u64) -> Result<(), PersistError> {
        let mut state = self.state.borrow_mut();
        state.enter(Operation::SetCurrency)?;
        state.currency.insert(user, amount);
        Ok(())
    }
}
