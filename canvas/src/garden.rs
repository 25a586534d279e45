//! Garden controller: canonical placed items, inventory and currency, with
//! optimistic mutations reconciled against persistence.
//!
//! DESIGN
//! ======
//! Every mutation is split in two. The synchronous half (`place`,
//! `move_item`, `return_to_inventory`, `purchase`) validates, mutates
//! [`GardenDoc`] immediately and returns a [`Pending`] describing the writes
//! it owes. The caller runs those writes with [`crate::persist::execute`]
//! whenever it likes and hands the resulting [`Settlement`] back to
//! [`GardenController::settle`], which either confirms or reverses the
//! specific change that failed. The controller never awaits and never holds
//! a reference across an await point.
//!
//! Rollbacks never restore a snapshot. They re-apply the inverse of one
//! change to whatever the state is now, checking that the change is still
//! there to reverse, so a newer mutation that landed in between is kept.
//! Per kind, `placed + inventory` is unchanged by every place/move/return,
//! successful or not.
//!
//! ERROR HANDLING
//! ==============
//! Precondition failures (unknown kind, empty inventory, not enough
//! currency) are returned before any state changes. Persistence failures on
//! place, return and purchase come back from `settle` as
//! [`GardenError::Persist`] after the rollback has been applied. Move
//! failures are logged and the local position is kept. When one of two
//! concurrent writes succeeded, `settle` issues compensating writes; their
//! own failures are logged and not retried.

#[cfg(test)]
#[path = "garden_test.rs"]
mod garden_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::catalog::Catalog;
use crate::doc::{GardenDoc, InventoryEntry, ItemId, PlacedItem, UserId};
use crate::geom::{Bounds, ItemPos, Point};
use crate::persist::{CallOk, ItemRecord, OpId, Pending, PersistCall, PersistError, PersistPlan, Settlement};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GardenError {
    #[error("unknown item kind: {0}")]
    UnknownKind(String),
    #[error("no placed item with id {0}")]
    UnknownItem(ItemId),
    #[error("no {0} left in inventory")]
    OutOfStock(String),
    #[error("inventory cannot hold more {0}")]
    InventoryFull(String),
    #[error("not enough currency: price {price}, balance {balance}")]
    InsufficientFunds { price: u64, balance: u64 },
    #[error("{op} was not saved: {source}")]
    Persist {
        op: &'static str,
        #[source]
        source: PersistError,
    },
}

impl GardenError {
    /// Short message suitable for a toast or status line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownKind(_) => "That item is not available.".into(),
            Self::UnknownItem(_) => "That item is no longer in your garden.".into(),
            Self::OutOfStock(kind) => format!("You have no {kind} left to place."),
            Self::InventoryFull(kind) => format!("You cannot hold any more {kind}."),
            Self::InsufficientFunds { price, balance } => {
                format!("You need {price} coins but only have {balance}.")
            }
            Self::Persist { op: "place", .. } => "Could not place the item. It is back in your inventory.".into(),
            Self::Persist { op: "return", .. } => "Could not return the item. It stays in your garden.".into(),
            Self::Persist { op: "purchase", .. } => "Purchase failed. Your coins were refunded.".into(),
            Self::Persist { .. } => "Could not save your garden.".into(),
        }
    }
}

/// Outcome of applying a [`Settlement`].
#[derive(Debug, Default)]
pub struct Settled {
    /// Set when an optimistic change was reversed and the user should know.
    pub error: Option<GardenError>,
    /// Follow-up or compensating writes to execute next.
    pub followups: Vec<Pending>,
}

/// What `settle` needs to confirm or reverse one in-flight op.
#[derive(Debug, Clone)]
enum Inflight {
    Place { item: ItemId, kind: String },
    Move { item: ItemId, revision: u64 },
    Return { item: PlacedItem, index: usize, delete_issued: bool },
    Purchase { kind: String, price: u64 },
    Compensation,
}

impl Inflight {
    fn label(&self) -> &'static str {
        match self {
            Self::Place { .. } => "place",
            Self::Move { .. } => "move",
            Self::Return { .. } => "return",
            Self::Purchase { .. } => "purchase",
            Self::Compensation => "compensation",
        }
    }
}

pub struct GardenController {
    user: UserId,
    catalog: Catalog,
    bounds: Bounds,
    doc: GardenDoc,
    inflight: HashMap<OpId, Inflight>,
    next_op: u64,
}

impl GardenController {
    #[must_use]
    pub fn new(user: UserId, catalog: Catalog, bounds: Bounds) -> Self {
        Self { user, catalog, bounds, doc: GardenDoc::new(), inflight: HashMap::new(), next_op: 1 }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn doc(&self) -> &GardenDoc {
        &self.doc
    }

    #[must_use]
    pub fn placed(&self) -> &[PlacedItem] {
        self.doc.placed()
    }

    #[must_use]
    pub fn inventory(&self) -> &[InventoryEntry] {
        self.doc.inventory()
    }

    #[must_use]
    pub fn currency(&self) -> u64 {
        self.doc.currency()
    }

    /// Number of ops still waiting for a settlement.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Replace all state with rows loaded from persistence.
    ///
    /// Rows naming kinds the catalog does not know are dropped. Positions are
    /// clamped to the current bounds. Outstanding ops are forgotten.
    pub fn hydrate(&mut self, items: Vec<ItemRecord>, inventory: Vec<InventoryEntry>, currency: u64) {
        let placed: Vec<PlacedItem> = items
            .into_iter()
            .filter_map(|record| {
                if !self.catalog.contains(&record.kind) {
                    tracing::warn!(kind = %record.kind, item_id = %record.id, "dropping placed item of unknown kind");
                    return None;
                }
                let pos = self.bounds.clamp_pos(ItemPos::new(record.x, record.y));
                Some(PlacedItem {
                    id: record.id,
                    kind: record.kind,
                    x: pos.x,
                    y: pos.y,
                    remote_id: Some(record.id),
                    revision: 0,
                    placed_at_ms: None,
                })
            })
            .collect();
        let inventory: Vec<InventoryEntry> = inventory
            .into_iter()
            .filter(|entry| {
                let known = self.catalog.contains(&entry.kind);
                if !known {
                    tracing::warn!(kind = %entry.kind, "dropping inventory entry of unknown kind");
                }
                known
            })
            .collect();
        tracing::info!(placed = placed.len(), kinds = inventory.len(), currency, "garden hydrated");
        self.doc.load(placed, inventory, currency);
        self.inflight.clear();
    }

    // =============================================================
    // Optimistic operations
    // =============================================================

    /// Take one `kind` out of inventory and put it in the garden at `at`
    /// (garden-local, clamped).
    ///
    /// # Errors
    ///
    /// [`GardenError::UnknownKind`] or [`GardenError::OutOfStock`]; state is
    /// untouched in both cases.
    pub fn place(&mut self, kind: &str, at: Point, now_ms: f64) -> Result<Pending, GardenError> {
        if !self.catalog.contains(kind) {
            return Err(GardenError::UnknownKind(kind.to_owned()));
        }
        let quantity = self.doc.take_one(kind).ok_or_else(|| GardenError::OutOfStock(kind.to_owned()))?;
        let pos = self.bounds.clamp(at);
        let id = Uuid::new_v4();
        self.doc.push_item(PlacedItem {
            id,
            kind: kind.to_owned(),
            x: pos.x,
            y: pos.y,
            remote_id: None,
            revision: 0,
            placed_at_ms: Some(now_ms),
        });
        tracing::debug!(item_id = %id, kind, x = pos.x, y = pos.y, "item placed");
        Ok(self.issue(
            Inflight::Place { item: id, kind: kind.to_owned() },
            vec![
                PersistCall::Create { kind: kind.to_owned(), x: pos.x, y: pos.y },
                PersistCall::SetQuantity { kind: kind.to_owned(), quantity },
            ],
        ))
    }

    /// Move a placed item to `at` (garden-local, clamped).
    ///
    /// Returns `None` when nothing needs writing: the position did not change,
    /// or the item's creation is still in flight (the position is written once
    /// it confirms).
    ///
    /// # Errors
    ///
    /// [`GardenError::UnknownItem`].
    pub fn move_item(&mut self, id: ItemId, at: Point) -> Result<Option<Pending>, GardenError> {
        let pos = self.bounds.clamp(at);
        let item = self.doc.item_mut(&id).ok_or(GardenError::UnknownItem(id))?;
        if item.pos() == pos {
            return Ok(None);
        }
        item.x = pos.x;
        item.y = pos.y;
        item.revision += 1;
        let revision = item.revision;
        let Some(remote) = item.remote_id else {
            tracing::debug!(item_id = %id, "move held until creation confirms");
            return Ok(None);
        };
        Ok(Some(self.issue(
            Inflight::Move { item: id, revision },
            vec![PersistCall::UpdatePosition { remote, x: pos.x, y: pos.y }],
        )))
    }

    /// Remove a placed item and put its unit back in inventory.
    ///
    /// # Errors
    ///
    /// [`GardenError::UnknownItem`] or [`GardenError::InventoryFull`].
    pub fn return_to_inventory(&mut self, id: ItemId) -> Result<Pending, GardenError> {
        let kind = self.doc.item(&id).map(|i| i.kind.clone()).ok_or(GardenError::UnknownItem(id))?;
        if !self.doc.has_room(&kind) {
            return Err(GardenError::InventoryFull(kind));
        }
        let (index, item) = self.doc.remove_item(&id).ok_or(GardenError::UnknownItem(id))?;
        let Some(quantity) = self.doc.add_one(&item.kind) else {
            self.doc.reinstate_item(index, item);
            return Err(GardenError::InventoryFull(kind));
        };
        let mut calls = Vec::with_capacity(2);
        if let Some(remote) = item.remote_id {
            calls.push(PersistCall::Delete { remote });
        }
        calls.push(PersistCall::SetQuantity { kind: item.kind.clone(), quantity });
        let delete_issued = item.remote_id.is_some();
        tracing::debug!(item_id = %id, kind = %item.kind, "item returned to inventory");
        Ok(self.issue(Inflight::Return { item, index, delete_issued }, calls))
    }

    /// Buy one `kind` with currency.
    ///
    /// # Errors
    ///
    /// [`GardenError::UnknownKind`], [`GardenError::InsufficientFunds`] or
    /// [`GardenError::InventoryFull`].
    pub fn purchase(&mut self, kind: &str) -> Result<Pending, GardenError> {
        let price = self
            .catalog
            .get(kind)
            .map(|k| u64::from(k.price))
            .ok_or_else(|| GardenError::UnknownKind(kind.to_owned()))?;
        let balance = self.doc.currency();
        if balance < price {
            return Err(GardenError::InsufficientFunds { price, balance });
        }
        let Some(quantity) = self.doc.add_one(kind) else {
            return Err(GardenError::InventoryFull(kind.to_owned()));
        };
        let amount = balance - price;
        self.doc.set_currency(amount);
        tracing::debug!(kind, price, balance = amount, "item purchased");
        Ok(self.issue(
            Inflight::Purchase { kind: kind.to_owned(), price },
            vec![
                PersistCall::SetCurrency { amount },
                PersistCall::SetQuantity { kind: kind.to_owned(), quantity },
            ],
        ))
    }

    fn issue(&mut self, inflight: Inflight, calls: PersistPlan) -> Pending {
        let op = OpId(self.next_op);
        self.next_op += 1;
        self.inflight.insert(op, inflight);
        Pending { op, calls }
    }

    fn compensate(&mut self, calls: PersistPlan) -> Option<Pending> {
        if calls.is_empty() {
            return None;
        }
        tracing::debug!(calls = calls.len(), "issuing compensating writes");
        Some(self.issue(Inflight::Compensation, calls))
    }

    // =============================================================
    // Reconciliation
    // =============================================================

    /// Apply the results of a previously issued [`Pending`].
    pub fn settle(&mut self, settlement: Settlement) -> Settled {
        let Some(inflight) = self.inflight.remove(&settlement.op) else {
            tracing::debug!(op = %settlement.op, "settlement for unknown op ignored");
            return Settled::default();
        };
        let label = inflight.label();
        match inflight {
            Inflight::Place { item, kind } => self.settle_place(item, &kind, &settlement),
            Inflight::Move { item, revision } => {
                self.settle_move(item, revision, &settlement);
                Settled::default()
            }
            Inflight::Return { item, index, delete_issued } => {
                self.settle_return(item, index, delete_issued, &settlement)
            }
            Inflight::Purchase { kind, price } => self.settle_purchase(&kind, price, &settlement),
            Inflight::Compensation => {
                for err in settlement.results.iter().filter_map(|r| r.as_ref().err()) {
                    tracing::error!(error = %err, op = %settlement.op, kind = label, "compensating write failed");
                }
                Settled::default()
            }
        }
    }

    fn settle_place(&mut self, local: ItemId, kind: &str, s: &Settlement) -> Settled {
        let created = match s.result(0) {
            Some(Ok(CallOk::Created(record))) => Some(record.clone()),
            _ => None,
        };
        let quantity_ok = is_ok(s.result(1));

        if let (Some(record), true) = (&created, quantity_ok) {
            return Settled { error: None, followups: self.confirm_place(local, record).into_iter().collect() };
        }

        let source = failure(s);
        tracing::warn!(error = %source, item_id = %local, kind, "place failed, rolling back");
        if let Some((index, item)) = self.doc.remove_item(&local) {
            if self.doc.add_one(kind).is_none() {
                tracing::error!(item_id = %local, kind, "inventory full, keeping unsaved item");
                self.doc.reinstate_item(index, item);
            }
        }
        let mut calls = Vec::new();
        if let Some(record) = created {
            calls.push(PersistCall::Delete { remote: record.id });
        }
        if quantity_ok {
            calls.push(PersistCall::SetQuantity { kind: kind.to_owned(), quantity: self.doc.quantity(kind) });
        }
        Settled {
            error: Some(GardenError::Persist { op: "place", source }),
            followups: self.compensate(calls).into_iter().collect(),
        }
    }

    fn confirm_place(&mut self, local: ItemId, record: &ItemRecord) -> Option<Pending> {
        if let Some(item) = self.doc.item_mut(&local) {
            item.remote_id = Some(record.id);
            if item.x == record.x && item.y == record.y {
                return None;
            }
            let (x, y, revision) = (item.x, item.y, item.revision);
            tracing::debug!(item_id = %local, x, y, "creation confirmed at a stale position, syncing");
            return Some(self.issue(
                Inflight::Move { item: local, revision },
                vec![PersistCall::UpdatePosition { remote: record.id, x, y }],
            ));
        }

        // Returned while the create was in flight. If that return is still
        // unsettled, let it own the delete.
        for inflight in self.inflight.values_mut() {
            if let Inflight::Return { item, .. } = inflight {
                if item.id == local {
                    item.remote_id = Some(record.id);
                    return None;
                }
            }
        }
        self.compensate(vec![PersistCall::Delete { remote: record.id }])
    }

    fn settle_move(&mut self, id: ItemId, revision: u64, s: &Settlement) {
        let current = self.doc.item(&id).map(|i| i.revision);
        if current != Some(revision) {
            tracing::debug!(item_id = %id, revision, "superseded position response ignored");
            return;
        }
        if let Some(Err(err)) = s.result(0) {
            tracing::warn!(error = %err, item_id = %id, "position write failed, keeping local position");
        }
    }

    fn settle_return(&mut self, item: PlacedItem, index: usize, delete_issued: bool, s: &Settlement) -> Settled {
        let (delete, quantity) = if delete_issued { (Some(is_ok(s.result(0))), s.result(1)) } else { (None, s.result(0)) };
        let quantity_ok = is_ok(quantity);
        let kind = item.kind.clone();

        if delete != Some(false) && quantity_ok {
            // A create that confirmed after the return left a row to remove.
            let owed = match (delete_issued, item.remote_id) {
                (false, Some(remote)) => self.compensate(vec![PersistCall::Delete { remote }]),
                _ => None,
            };
            return Settled { error: None, followups: owed.into_iter().collect() };
        }

        let source = failure(s);
        if delete == Some(true) {
            // The row is gone; keep the return and resend the quantity.
            tracing::warn!(error = %source, item_id = %item.id, kind = %kind, "return quantity write failed, resyncing");
            let calls = vec![PersistCall::SetQuantity { quantity: self.doc.quantity(&kind), kind }];
            return Settled { error: None, followups: self.compensate(calls).into_iter().collect() };
        }

        if self.doc.take_one(&kind).is_some() {
            tracing::warn!(error = %source, item_id = %item.id, kind = %kind, "return failed, reinstating item");
            self.doc.reinstate_item(index, item);
            let calls = if quantity_ok {
                vec![PersistCall::SetQuantity { quantity: self.doc.quantity(&kind), kind }]
            } else {
                Vec::new()
            };
            return Settled {
                error: Some(GardenError::Persist { op: "return", source }),
                followups: self.compensate(calls).into_iter().collect(),
            };
        }

        // The returned unit was placed again in the meantime; finish the return.
        tracing::warn!(error = %source, item_id = %item.id, kind = %kind, "return failed after unit was reused, retrying");
        let mut calls = Vec::new();
        if let Some(remote) = item.remote_id {
            calls.push(PersistCall::Delete { remote });
        }
        if !quantity_ok {
            calls.push(PersistCall::SetQuantity { quantity: self.doc.quantity(&kind), kind });
        }
        Settled { error: None, followups: self.compensate(calls).into_iter().collect() }
    }

    fn settle_purchase(&mut self, kind: &str, price: u64, s: &Settlement) -> Settled {
        if s.all_ok() {
            return Settled::default();
        }
        let currency_ok = is_ok(s.result(0));
        let quantity_ok = is_ok(s.result(1));
        let source = failure(s);
        tracing::warn!(error = %source, kind, price, "purchase failed, refunding");

        self.doc.set_currency(self.doc.currency().saturating_add(price));
        let mut calls = Vec::new();
        if self.doc.take_one(kind).is_none() {
            // Already placed; take back the newest one.
            let latest = self.doc.latest_of_kind(kind).map(|i| i.id);
            if let Some((_, removed)) = latest.and_then(|id| self.doc.remove_item(&id)) {
                if let Some(remote) = removed.remote_id {
                    calls.push(PersistCall::Delete { remote });
                }
            }
        }
        if currency_ok {
            calls.push(PersistCall::SetCurrency { amount: self.doc.currency() });
        }
        if quantity_ok {
            calls.push(PersistCall::SetQuantity { kind: kind.to_owned(), quantity: self.doc.quantity(kind) });
        }
        Settled {
            error: Some(GardenError::Persist { op: "purchase", source }),
            followups: self.compensate(calls).into_iter().collect(),
        }
    }
}

fn is_ok(result: Option<&Result<CallOk, PersistError>>) -> bool {
    matches!(result, Some(Ok(_)))
}

fn failure(s: &Settlement) -> PersistError {
    s.first_error()
        .cloned()
        .unwrap_or_else(|| PersistError::Decode(format!("unexpected result shape for {}", s.op)))
}
