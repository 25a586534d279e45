//! Screen geometry: points, rectangles, and garden-bounds clamping.
//!
//! All coordinates are CSS pixels. Pointer events arrive in client space and
//! are converted to garden-local space by subtracting the garden rectangle's
//! origin; placed items live in garden-local space with integer top-left
//! coordinates.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in client or garden-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive containment test on all four edges.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.is_finite() && p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring tile.
    #[must_use]
    pub fn covers(&self, p: Point) -> bool {
        p.is_finite() && p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Translate a point from the rectangle's parent space into its local space.
    #[must_use]
    pub fn to_local(&self, p: Point) -> Point {
        Point::new(p.x - self.x, p.y - self.y)
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Integer top-left position of a placed item in garden-local space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemPos {
    pub x: i32,
    pub y: i32,
}

impl ItemPos {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Garden canvas extent and the square footprint of every placed item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub item_size: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(width: f64, height: f64, item_size: f64) -> Self {
        Self { width, height, item_size }
    }

    /// Largest legal item origin on each axis. Never negative, even when the
    /// canvas is smaller than one item.
    #[must_use]
    pub fn max_origin(&self) -> (f64, f64) {
        ((self.width - self.item_size).max(0.0), (self.height - self.item_size).max(0.0))
    }

    /// Clamp a fractional origin into `[0, width - item] x [0, height - item]`
    /// and round to whole pixels. Non-finite components collapse to 0.
    #[must_use]
    pub fn clamp(&self, p: Point) -> ItemPos {
        let (max_x, max_y) = self.max_origin();
        ItemPos::new(clamp_axis(p.x, max_x), clamp_axis(p.y, max_y))
    }

    /// Clamp an already-integral position (e.g. from persistence or a host call).
    #[must_use]
    pub fn clamp_pos(&self, pos: ItemPos) -> ItemPos {
        self.clamp(pos.to_point())
    }

    /// Whether `pos` already satisfies the bounds invariant.
    #[must_use]
    pub fn holds(&self, pos: ItemPos) -> bool {
        self.clamp_pos(pos) == pos
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_axis(v: f64, max: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    // `max` is floored so the rounded result can never exceed the bound.
    let max = max.floor();
    v.round().clamp(0.0, max) as i32
}
