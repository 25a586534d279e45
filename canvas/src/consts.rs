//! Shared numeric constants for the garden canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Default garden canvas width in CSS pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 300.0;

/// Default garden canvas height in CSS pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 300.0;

/// Default edge length of the square footprint of a placed item.
pub const DEFAULT_ITEM_SIZE: f64 = 40.0;

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel (CSS px) below which a press/release pair is a tap.
pub const DEFAULT_TAP_SLOP_PX: f64 = 4.0;

// ── Particles ───────────────────────────────────────────────────

/// Population the particle system steers towards.
pub const DEFAULT_PARTICLE_TARGET: usize = 12;

/// Population above which culling becomes certain rather than probabilistic.
pub const DEFAULT_PARTICLE_MAX: usize = 15;

/// Per-tick probability of culling one particle while above target.
pub const PARTICLE_CULL_CHANCE: f64 = 0.1;

/// Degrees added to every particle's rotation per tick.
pub const PARTICLE_SPIN_DEG: f64 = 2.0;

/// How long one season lasts before the clock advances.
pub const DEFAULT_SEASON_PERIOD_MS: f64 = 45_000.0;

// ── Wind ────────────────────────────────────────────────────────

/// Largest magnitude the wind random walk may reach.
pub const WIND_LIMIT: f64 = 0.5;

/// Largest single random-walk step.
pub const WIND_STEP: f64 = 0.02;

/// Per-tick probability the wind reverses direction.
pub const WIND_FLIP_CHANCE: f64 = 0.005;

/// Placed-item sway in degrees per unit of wind.
pub const ITEM_SWAY_DEG_PER_WIND: f64 = 6.0;

// ── Rendering ───────────────────────────────────────────────────

/// Grid pitch of the grass stipple overlay.
pub const GRASS_STIPPLE_PITCH: f64 = 16.0;

/// Number of moving sparkle dots on the river band.
pub const RIVER_SPARKLES: usize = 5;

/// Default duration of the drop-in "pop" for freshly placed items.
pub const DEFAULT_DROP_ANIMATION_MS: f64 = 600.0;

/// Dash segment length of the drag preview outline.
pub const PREVIEW_DASH_PX: f64 = 5.0;
