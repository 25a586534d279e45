//! Persistence contract consumed by the garden controller.
//!
//! DESIGN
//! ======
//! The controller never awaits. Each optimistic mutation returns a
//! [`Pending`] ticket listing the writes it needs ([`PersistCall`]).
//! [`execute`] performs those writes against a [`PersistenceService`]
//! (concurrently when there is more than one) and produces a
//! [`Settlement`], which the controller applies later as a confirm or a
//! rollback. Nothing here borrows the controller, so the render loop keeps
//! reading state while a request is in flight.
//!
//! ERROR HANDLING
//! ==============
//! Every service call returns `Result<_, PersistError>`; nothing throws across
//! this boundary. A settlement carries one result per call, in call order,
//! so partial failure is visible to the controller.

#[cfg(any(test, feature = "web"))]
pub mod http;
pub mod memory;


use std::fmt;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::doc::{InventoryEntry, ItemId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("response decode failed: {0}")]
    Decode(String),
    #[error("service unavailable for {0}")]
    Unavailable(Operation),
}

/// A placed item as the persistence side stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub kind: String,
    pub x: i32,
    pub y: i32,
}

/// The CRUD surface the garden needs. Implementations may be remote.
#[async_trait(?Send)]
pub trait PersistenceService {
    /// Create a placed item row.
    ///
    /// # Errors
    ///
    /// Any transport or validation failure.
    async fn create_placed_item(&self, user: UserId, kind: &str, x: i32, y: i32) -> Result<ItemRecord, PersistError>;

    /// Overwrite an item's position (last write wins).
    ///
    /// # Errors
    ///
    /// Any transport or validation failure, or [`PersistError::NotFound`].
    async fn update_placed_item_position(&self, item: ItemId, x: i32, y: i32) -> Result<ItemRecord, PersistError>;

    /// Delete a placed item row.
    ///
    /// # Errors
    ///
    /// Any transport or validation failure, or [`PersistError::NotFound`].
    async fn delete_placed_item(&self, item: ItemId) -> Result<(), PersistError>;

    /// All placed items of a user.
    ///
    /// # Errors
    ///
    /// Any transport failure.
    async fn list_placed_items(&self, user: UserId) -> Result<Vec<ItemRecord>, PersistError>;

    /// Set (or create) the inventory quantity of a kind.
    ///
    /// # Errors
    ///
    /// Any transport or validation failure.
    async fn adjust_inventory_quantity(
        &self,
        user: UserId,
        kind: &str,
        quantity: u32,
    ) -> Result<InventoryEntry, PersistError>;

    /// All inventory entries of a user.
    ///
    /// # Errors
    ///
    /// Any transport failure.
    async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryEntry>, PersistError>;

    /// Set a user's currency balance.
    ///
    /// # Errors
    ///
    /// Any transport or validation failure.
    async fn adjust_user_currency(&self, user: UserId, amount: u64) -> Result<(), PersistError>;
}

/// Names of the service operations, used for logging and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateItem,
    UpdatePosition,
    DeleteItem,
    ListItems,
    SetQuantity,
    ListInventory,
    SetCurrency,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::CreateItem,
        Self::UpdatePosition,
        Self::DeleteItem,
        Self::ListItems,
        Self::SetQuantity,
        Self::ListInventory,
        Self::SetCurrency,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateItem => "create_item",
            Self::UpdatePosition => "update_position",
            Self::DeleteItem => "delete_item",
            Self::ListItems => "list_items",
            Self::SetQuantity => "set_quantity",
            Self::ListInventory => "list_inventory",
            Self::SetCurrency => "set_currency",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation `{s}`"))
    }
}

// =============================================================
// Plans and settlements
// =============================================================

/// Identifier of one optimistic operation awaiting persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// One write requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PersistCall {
    Create { kind: String, x: i32, y: i32 },
    UpdatePosition { remote: ItemId, x: i32, y: i32 },
    Delete { remote: ItemId },
    SetQuantity { kind: String, quantity: u32 },
    SetCurrency { amount: u64 },
}

impl PersistCall {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::CreateItem,
            Self::UpdatePosition { .. } => Operation::UpdatePosition,
            Self::Delete { .. } => Operation::DeleteItem,
            Self::SetQuantity { .. } => Operation::SetQuantity,
            Self::SetCurrency { .. } => Operation::SetCurrency,
        }
    }
}

/// Successful outcome of one [`PersistCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOk {
    Created(ItemRecord),
    Updated(ItemRecord),
    Deleted,
    Quantity(InventoryEntry),
    Currency,
}

pub type CallResult = Result<CallOk, PersistError>;

/// Ordered writes making one optimistic change durable.
pub type PersistPlan = Vec<PersistCall>;

/// Writes owed for one optimistic operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pending {
    pub op: OpId,
    pub calls: PersistPlan,
}

/// Results of a [`Pending`], in the same order as its calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub op: OpId,
    pub results: Vec<CallResult>,
}

impl Settlement {
    /// Whether every call succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    /// First failure, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&PersistError> {
        self.results.iter().find_map(|r| r.as_ref().err())
    }

    /// Result of the call at `index`, if it exists.
    #[must_use]
    pub fn result(&self, index: usize) -> Option<&CallResult> {
        self.results.get(index)
    }
}

/// Perform every call of `pending` concurrently and collect the results.
pub async fn execute(service: &dyn PersistenceService, user: UserId, pending: Pending) -> Settlement {
    let results = join_all(pending.calls.iter().map(|call| run_call(service, user, call))).await;
    Settlement { op: pending.op, results }
}

async fn run_call(service: &dyn PersistenceService, user: UserId, call: &PersistCall) -> CallResult {
    match call {
        PersistCall::Create { kind, x, y } => service.create_placed_item(user, kind, *x, *y).await.map(CallOk::Created),
        PersistCall::UpdatePosition { remote, x, y } => {
            service.update_placed_item_position(*remote, *x, *y).await.map(CallOk::Updated)
        }
        PersistCall::Delete { remote } => service.delete_placed_item(*remote).await.map(|()| CallOk::Deleted),
        PersistCall::SetQuantity { kind, quantity } => {
            service.adjust_inventory_quantity(user, kind, *quantity).await.map(CallOk::Quantity)
        }
        PersistCall::SetCurrency { amount } => service.adjust_user_currency(user, *amount).await.map(|()| CallOk::Currency),
    }
}

/// Placed items and inventory of a user, fetched concurrently.
///
/// # Errors
///
/// Returns the first failure of either listing.
pub async fn load_garden(
    service: &dyn PersistenceService,
    user: UserId,
) -> Result<(Vec<ItemRecord>, Vec<InventoryEntry>), PersistError> {
    let (items, inventory) = futures::join!(service.list_placed_items(user), service.list_inventory(user));
    Ok((items?, inventory?))
}
