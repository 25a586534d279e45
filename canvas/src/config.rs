//! Engine configuration, deserialized from JSON supplied by the host.
//!
//! Every field has a default so an empty object (`{}`) is a valid config.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_DROP_ANIMATION_MS, DEFAULT_ITEM_SIZE,
    DEFAULT_PARTICLE_MAX, DEFAULT_PARTICLE_TARGET, DEFAULT_SEASON_PERIOD_MS, DEFAULT_TAP_SLOP_PX,
};
use crate::geom::Bounds;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("duplicate catalog entry: {0}")]
    DuplicateKind(String),
    #[error("catalog entry with empty name")]
    EmptyKindName,
}

/// Tunables for the garden engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Garden canvas width in CSS pixels.
    pub width: f64,
    /// Garden canvas height in CSS pixels.
    pub height: f64,
    /// Edge length of a placed item's square footprint.
    pub item_size: f64,
    /// Pointer travel below which a gesture counts as a tap.
    pub tap_slop_px: f64,
    /// Particle population target.
    pub particle_target: usize,
    /// Particle population ceiling.
    pub particle_max: usize,
    /// Duration of one season in milliseconds.
    pub season_period_ms: f64,
    /// Prefix joined to every catalog `asset_key` when loading images.
    pub asset_base_url: String,
    /// Duration of the drop-in animation for new items.
    pub drop_animation_ms: f64,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            item_size: DEFAULT_ITEM_SIZE,
            tap_slop_px: DEFAULT_TAP_SLOP_PX,
            particle_target: DEFAULT_PARTICLE_TARGET,
            particle_max: DEFAULT_PARTICLE_MAX,
            season_period_ms: DEFAULT_SEASON_PERIOD_MS,
            asset_base_url: String::new(),
            drop_animation_ms: DEFAULT_DROP_ANIMATION_MS,
        }
    }
}

impl GardenConfig {
    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("item_size", self.item_size)?;
        positive("season_period_ms", self.season_period_ms)?;
        if !self.tap_slop_px.is_finite() || self.tap_slop_px < 0.0 {
            return Err(ConfigError::Invalid { field: "tap_slop_px", reason: "must be >= 0".into() });
        }
        if !self.drop_animation_ms.is_finite() || self.drop_animation_ms < 0.0 {
            return Err(ConfigError::Invalid { field: "drop_animation_ms", reason: "must be >= 0".into() });
        }
        if self.particle_max < self.particle_target {
            return Err(ConfigError::Invalid {
                field: "particle_max",
                reason: format!("must be >= particle_target ({})", self.particle_target),
            });
        }
        Ok(())
    }

    /// Garden extent and item footprint used for clamping and hit-testing.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height, self.item_size)
    }

    /// Full URL of an image asset.
    #[must_use]
    pub fn asset_url(&self, asset_key: &str) -> String {
        join_asset_url(&self.asset_base_url, asset_key)
    }
}

pub(crate) fn join_asset_url(base: &str, key: &str) -> String {
    if base.is_empty() {
        return key.to_owned();
    }
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be a positive number, got {v}") })
    }
}
