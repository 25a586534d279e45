//! Garden canvas: rendering, drag-and-drop placement and persistence
//! reconciliation for a virtual decorative garden.
//!
//! This crate is compiled to WebAssembly and runs in the browser, and also
//! natively (for tests and the `garden` CLI). It owns the full lifecycle of
//! the garden canvas: translating raw input events into placement intents,
//! applying them optimistically, reconciling them against a persistence
//! service, and drawing the scene every animation frame. The host layer is
//! responsible only for wiring DOM events to the engine and running the
//! persistence writes the engine hands back as [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`garden`] | Garden controller: optimistic operations and rollback |
//! | [`doc`] | Placed items, inventory entries and the in-memory store |
//! | [`gesture`] | Press/drag/release state machine and drop intents |
//! | [`input`] | Pointer identities, drag sources and drag payloads |
//! | [`hit`] | Hit-testing against placed items, cells and containers |
//! | [`render`] | Scene snapshot and the per-frame draw routine |
//! | [`surface`] | 2D drawing surface trait, canvas and display-list impls |
//! | [`particles`] | Ambient particles, wind and seasons |
//! | [`assets`] | Image cache keyed by catalog asset |
//! | [`catalog`] | Decorative item kinds and tint tokens |
//! | [`persist`] | Persistence contract, in-memory and REST services |
//! | [`config`] | Engine configuration |
//! | [`geom`] | Points, rectangles and bounds clamping |
//! | [`consts`] | Shared numeric constants (sizes, rates, limits) |
//! | `host` | Browser host (`web` feature) |

pub mod assets;
pub mod catalog;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod garden;
pub mod geom;
pub mod gesture;
pub mod hit;
#[cfg(feature = "web")]
pub mod host;
pub mod input;
pub mod particles;
pub mod persist;
pub mod render;
pub mod surface;
