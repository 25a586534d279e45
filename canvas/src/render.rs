//! Rendering: draws one frame of the garden scene onto a [`Surface`].
//!
//! [`render_frame`] is a pure function of the [`Scene`] snapshot and the
//! asset cache. It mutates nothing, so calling it twice with the same
//! snapshot draws the same frame. The grass stipple is random-looking but
//! derived from `Scene::texture_seed`, so it only shimmers when the caller
//! changes the seed.
//!
//! Draw order, back to front: clear, ground, river, placed items, particles,
//! the item being dragged, the drag preview.
//!
//! Fallible surface calls propagate `S::Error`. The top-level caller
//! ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::assets::AssetCache;
use crate::consts::{GRASS_STIPPLE_PITCH, ITEM_SWAY_DEG_PER_WIND, PREVIEW_DASH_PX, RIVER_SPARKLES};
use crate::doc::ItemId;
use crate::geom::Point;
use crate::particles::Particle;
use crate::surface::Surface;

const GROUND_COLOR: &str = "#3cb066";
const GRASS_LIGHT: &str = "#22c55e";
const GRASS_DARK: &str = "#16a34a";
const RIVER_STOPS: [(f64, &str); 4] = [
    (0.0, "rgba(59, 130, 246, 0.8)"),
    (0.33, "rgba(29, 78, 216, 0.6)"),
    (0.66, "rgba(96, 165, 250, 0.7)"),
    (1.0, "rgba(59, 130, 246, 0.8)"),
];
const RIVER_SPARKLE_COLOR: &str = "rgba(255, 255, 255, 0.6)";
const ITEM_SHADOW: &str = "rgba(0, 0, 0, 0.3)";
const SELECTION_COLOR: &str = "#3b82f6";
const EMOJI_FONT: &str = "24px Arial";
const PREVIEW_ALPHA: f64 = 0.7;

/// Smallest scale of a freshly dropped item.
const DROP_START_SCALE: f64 = 0.5;

// =============================================================
// Snapshot
// =============================================================

/// A placed (or dragged) item as the renderer needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneItem {
    pub id: Option<ItemId>,
    pub kind: String,
    pub emoji: String,
    /// Resolved CSS colour.
    pub tint: String,
    pub asset_key: Option<String>,
    /// Top-left in garden-local pixels.
    pub x: f64,
    pub y: f64,
    /// Drop-in scale, 1.0 once the animation is over.
    pub pop: f64,
}

/// Prospective drop location shown while dragging over the garden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragPreview {
    pub x: f64,
    pub y: f64,
    /// Semi-transparent duplicate drawn inside the outline (inventory drags).
    pub ghost: Option<SceneItem>,
}

/// Everything one frame needs. Built fresh by the engine every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
    pub item_size: f64,
    pub elapsed_ms: f64,
    pub texture_seed: u64,
    pub wind: f64,
    /// Placed items in draw order, excluding the one being dragged.
    pub items: Vec<SceneItem>,
    pub selected: Option<ItemId>,
    pub particles: Vec<Particle>,
    pub dragged: Option<SceneItem>,
    pub preview: Option<DragPreview>,
}

/// Scale of an item `age_ms` after it was dropped.
#[must_use]
pub fn drop_scale(age_ms: f64, duration_ms: f64) -> f64 {
    if !age_ms.is_finite() || duration_ms <= 0.0 || age_ms >= duration_ms {
        return 1.0;
    }
    let t = (age_ms / duration_ms).max(0.0);
    let eased = 1.0 - (1.0 - t).powi(3);
    DROP_START_SCALE + (1.0 - DROP_START_SCALE) * eased
}

// =============================================================
// Frame
// =============================================================

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any fallible surface call fails.
pub fn render_frame<S: Surface>(surface: &mut S, scene: &Scene, assets: &AssetCache<S::Image>) -> Result<(), S::Error> {
    // Layer 1: clear.
    surface.set_transform(scene.dpr, 0.0, 0.0, scene.dpr, 0.0, 0.0)?;
    surface.clear_rect(0.0, 0.0, scene.width, scene.height);

    // Layers 2-3: background.
    draw_ground(surface, scene);
    draw_river(surface, scene)?;

    // Layer 4: placed items.
    for item in &scene.items {
        let selected = item.id.is_some() && item.id == scene.selected;
        draw_item(surface, scene, item, selected, assets)?;
    }

    // Layer 5: particles.
    for particle in &scene.particles {
        if !particle.is_drawable() {
            continue;
        }
        draw_particle(surface, particle)?;
    }

    // Layer 6: the item under the pointer.
    if let Some(item) = &scene.dragged {
        draw_item(surface, scene, item, true, assets)?;
    }

    // Layer 7: drop preview.
    if let Some(preview) = &scene.preview {
        draw_preview(surface, scene, preview, assets)?;
    }
    Ok(())
}

// =============================================================
// Background
// =============================================================

fn draw_ground<S: Surface>(surface: &mut S, scene: &Scene) {
    surface.set_fill_color(GROUND_COLOR);
    surface.fill_rect(0.0, 0.0, scene.width, scene.height);

    let mut rng = SmallRng::seed_from_u64(scene.texture_seed);
    let mut light = Vec::new();
    let mut dark = Vec::new();
    let mut y = 0.0;
    while y < scene.height {
        let mut x = 0.0;
        while x < scene.width {
            if rng.random::<f64>() > 0.7 {
                light.push((x, y));
            }
            if rng.random::<f64>() > 0.8 {
                dark.push((x + GRASS_STIPPLE_PITCH / 2.0, y + GRASS_STIPPLE_PITCH / 2.0));
            }
            x += GRASS_STIPPLE_PITCH;
        }
        y += GRASS_STIPPLE_PITCH;
    }

    surface.set_fill_color(GRASS_LIGHT);
    for (x, y) in light {
        surface.fill_rect(x, y, 2.0, 2.0);
    }
    surface.set_fill_color(GRASS_DARK);
    for (x, y) in dark {
        surface.fill_rect(x, y, 1.0, 1.0);
    }
}

#[allow(clippy::cast_precision_loss)]
fn draw_river<S: Surface>(surface: &mut S, scene: &Scene) -> Result<(), S::Error> {
    let (w, h) = (scene.width, scene.height);
    let t = scene.elapsed_ms * 0.001;
    let top = h * 0.4 + (t * 0.5).sin() * 2.0;
    let band = h * 0.15;

    surface.set_fill_linear_gradient(Point::new(0.0, top), Point::new(w, top), &RIVER_STOPS)?;
    surface.begin_path();
    surface.move_to(0.0, top);
    surface.quadratic_curve_to(w * 0.25, top - 10.0, w * 0.5, top);
    surface.quadratic_curve_to(w * 0.75, top + 10.0, w, top - 5.0);
    surface.line_to(w, top + band);
    surface.quadratic_curve_to(w * 0.75, top + band + 10.0, w * 0.5, top + band);
    surface.quadratic_curve_to(w * 0.25, top + band - 10.0, 0.0, top + band);
    surface.close_path();
    surface.fill();

    surface.set_fill_color(RIVER_SPARKLE_COLOR);
    for i in 0..RIVER_SPARKLES {
        let i = i as f64;
        let x = (t * 50.0 + i * 100.0).rem_euclid(w.max(1.0));
        let y = top + band * 0.5 + (t * 2.0 + i).sin() * 5.0;
        surface.begin_path();
        surface.arc(x, y, 1.0, 0.0, 2.0 * PI)?;
        surface.fill();
    }
    Ok(())
}

// =============================================================
// Items
// =============================================================

fn draw_item<S: Surface>(
    surface: &mut S,
    scene: &Scene,
    item: &SceneItem,
    selected: bool,
    assets: &AssetCache<S::Image>,
) -> Result<(), S::Error> {
    let size = scene.item_size;
    let (cx, cy) = (item.x + size / 2.0, item.y + size / 2.0);

    surface.save();
    sway_and_pop(surface, scene, item, cx, cy)?;
    if selected {
        surface.set_shadow(ITEM_SHADOW, 8.0, 4.0, 4.0);
    } else {
        surface.set_shadow(ITEM_SHADOW, 4.0, 2.0, 2.0);
    }
    draw_item_body(surface, item, size, selected, assets)?;
    if selected {
        surface.set_shadow("transparent", 0.0, 0.0, 0.0);
        surface.set_stroke_color(SELECTION_COLOR);
        surface.set_line_width(2.0);
        surface.stroke_rect(item.x - 2.0, item.y - 2.0, size + 4.0, size + 4.0);
    }
    surface.restore();
    Ok(())
}

/// Sway around the item's base with the wind, and scale around its centre
/// while it pops in.
fn sway_and_pop<S: Surface>(surface: &mut S, scene: &Scene, item: &SceneItem, cx: f64, cy: f64) -> Result<(), S::Error> {
    let sway = (scene.wind * ITEM_SWAY_DEG_PER_WIND).to_radians();
    let pop = if item.pop.is_finite() { item.pop } else { 1.0 };
    if sway.abs() < f64::EPSILON && (pop - 1.0).abs() < f64::EPSILON {
        return Ok(());
    }
    let base = item.y + scene.item_size;
    surface.translate(cx, base)?;
    surface.rotate(sway)?;
    surface.translate(0.0, cy - base)?;
    surface.scale(pop, pop)?;
    surface.translate(-cx, -cy)?;
    Ok(())
}

/// Cached image if loaded, otherwise a tinted disc with the emoji.
fn draw_item_body<S: Surface>(
    surface: &mut S,
    item: &SceneItem,
    size: f64,
    selected: bool,
    assets: &AssetCache<S::Image>,
) -> Result<(), S::Error> {
    if let Some(image) = item.asset_key.as_deref().and_then(|key| assets.get(key)) {
        return surface.draw_image(image, item.x, item.y, size, size);
    }

    let (cx, cy) = (item.x + size / 2.0, item.y + size / 2.0);
    let backdrop = if selected { "rgba(255, 255, 255, 0.9)" } else { "rgba(255, 255, 255, 0.8)" };
    surface.set_fill_color(backdrop);
    surface.begin_path();
    surface.arc(cx, cy, size / 2.0 + 2.0, 0.0, 2.0 * PI)?;
    surface.fill();
    surface.set_stroke_color(&item.tint);
    surface.set_line_width(2.0);
    surface.stroke();

    surface.set_fill_color(&item.tint);
    surface.set_font(EMOJI_FONT);
    surface.set_text_align("center");
    surface.set_text_baseline("middle");
    surface.fill_text(&item.emoji, cx, cy)
}

// =============================================================
// Particles
// =============================================================

fn draw_particle<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), S::Error> {
    surface.save();
    surface.set_global_alpha(p.opacity.clamp(0.0, 1.0));
    surface.set_fill_color(p.color);
    if p.kind.is_ellipse() {
        surface.translate(p.x, p.y)?;
        surface.rotate(p.rotation.to_radians())?;
        surface.begin_path();
        surface.ellipse(0.0, 0.0, p.size, p.size * 1.5, 0.0, 0.0, 2.0 * PI)?;
        surface.fill();
    } else {
        if let Some(glow) = p.kind.glow() {
            surface.set_shadow(p.color, p.size * glow, 0.0, 0.0);
        }
        surface.begin_path();
        surface.arc(p.x, p.y, p.size, 0.0, 2.0 * PI)?;
        surface.fill();
    }
    surface.restore();
    Ok(())
}

// =============================================================
// Drag preview
// =============================================================

fn draw_preview<S: Surface>(
    surface: &mut S,
    scene: &Scene,
    preview: &DragPreview,
    assets: &AssetCache<S::Image>,
) -> Result<(), S::Error> {
    let size = scene.item_size;
    surface.save();
    if let Some(ghost) = &preview.ghost {
        surface.set_global_alpha(PREVIEW_ALPHA);
        let ghost = SceneItem { x: preview.x, y: preview.y, ..ghost.clone() };
        draw_item_body(surface, &ghost, size, false, assets)?;
        surface.set_global_alpha(1.0);
    }
    surface.set_stroke_color(SELECTION_COLOR);
    surface.set_line_width(3.0);
    surface.set_line_dash(&[PREVIEW_DASH_PX, PREVIEW_DASH_PX])?;
    surface.stroke_rect(preview.x, preview.y, size, size);
    surface.restore();
    Ok(())
}
