//! Input model: pointer identities, drag sources, drag payloads, and the
//! per-gesture drag session.
//!
//! Mouse, touch and native drag-and-drop all feed the same gesture machine
//! ([`crate::gesture::GestureController`]). `PointerId` keeps them apart so
//! that a second finger cannot hijack a gesture the first one started.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::ItemId;
use crate::geom::Point;

/// Which physical pointer produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum PointerId {
    Mouse,
    /// Browser `Touch.identifier`.
    Touch(i32),
    /// The HTML drag-and-drop transport.
    Native,
}

/// One entry of a `TouchEvent.changedTouches` list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i32,
    pub client: Point,
}

/// What a drag picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DragSource {
    /// One unit of an inventory entry.
    Inventory { kind: String },
    /// An item already in the garden.
    Garden { item: ItemId },
}

/// Transfer data carried through the native drag-and-drop API.
///
/// Serialized as `{"source":"inventory","kind":"ROSES"}` or
/// `{"source":"garden","item_id":"<uuid>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DragPayload {
    Inventory { kind: String },
    Garden { item_id: ItemId },
}

impl DragPayload {
    /// Parse transfer data.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for anything that is not a well-formed payload.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Encode for `DataTransfer::set_data`.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[must_use]
    pub fn into_source(self) -> DragSource {
        match self {
            Self::Inventory { kind } => DragSource::Inventory { kind },
            Self::Garden { item_id } => DragSource::Garden { item: item_id },
        }
    }
}

impl From<&DragSource> for DragPayload {
    fn from(source: &DragSource) -> Self {
        match source {
            DragSource::Inventory { kind } => Self::Inventory { kind: kind.clone() },
            DragSource::Garden { item } => Self::Garden { item_id: *item },
        }
    }
}

/// State of one press-move-release interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: DragSource,
    /// From the item's top-left to the press point. Kept for the whole drag
    /// so the item does not jump under the pointer.
    pub offset: Point,
    /// Client position of the press.
    pub start: Point,
    /// Latest client position.
    pub pointer: Point,
}

impl DragSession {
    #[must_use]
    pub fn new(source: DragSource, offset: Point, start: Point) -> Self {
        Self { source, offset, start, pointer: start }
    }

    /// Distance travelled from the press point.
    #[must_use]
    pub fn travel(&self) -> f64 {
        self.start.distance(self.pointer)
    }
}
