//! Decorative item catalog: immutable kinds created at startup from config.
//!
//! A kind's `name` is its unique key. Placed items and inventory entries
//! refer to kinds by name; the renderer looks the kind up here to decide
//! between the cached image and the emoji/tint fallback.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Catalog bundled with the crate, used when the host supplies none.
const DEFAULT_CATALOG_JSON: &str = include_str!("../assets/catalog.json");

/// Colour used when a tint token is not recognised.
pub const FALLBACK_TINT: &str = "#22c55e";

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorativeItemKind {
    /// Unique key, e.g. `"ROSES"`.
    pub name: String,
    /// Glyph drawn when no image is available.
    #[serde(alias = "emoji")]
    pub emoji_fallback: String,
    /// Image asset path relative to the configured asset base URL.
    #[serde(default, alias = "icon", skip_serializing_if = "Option::is_none")]
    pub asset_key: Option<String>,
    /// CSS colour or utility colour token (`text-pink-500`).
    #[serde(alias = "color")]
    pub tint: String,
    /// Shop price in in-game currency.
    #[serde(default)]
    pub price: u32,
}

impl DecorativeItemKind {
    /// The tint resolved to a drawable CSS colour.
    #[must_use]
    pub fn tint_color(&self) -> &str {
        resolve_tint(&self.tint)
    }
}

/// Lookup table of all known kinds, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: Vec<DecorativeItemKind>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty and duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyKindName`] or [`ConfigError::DuplicateKind`].
    pub fn new(kinds: Vec<DecorativeItemKind>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(kinds.len());
        for (i, kind) in kinds.iter().enumerate() {
            if kind.name.trim().is_empty() {
                return Err(ConfigError::EmptyKindName);
            }
            if index.insert(kind.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateKind(kind.name.clone()));
            }
        }
        Ok(Self { kinds, index })
    }

    /// Parse a JSON array of kinds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or invalid entries.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let kinds: Vec<DecorativeItemKind> = serde_json::from_str(raw)?;
        Self::new(kinds)
    }

    /// The catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled file is malformed.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_CATALOG_JSON)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DecorativeItemKind> {
        self.index.get(name).and_then(|&i| self.kinds.get(i))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecorativeItemKind> {
        self.kinds.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Map a tint token to a CSS colour.
///
/// Plain CSS colours (`#..`, `rgb(..)`, `hsl(..)`) pass through untouched.
#[must_use]
pub fn resolve_tint(token: &str) -> &str {
    let token = token.trim();
    if token.starts_with('#') || token.starts_with("rgb") || token.starts_with("hsl") {
        return token;
    }
    match token.strip_prefix("text-").unwrap_or(token) {
        "pink-400" => "#f472b6",
        "pink-500" => "#ec4899",
        "purple-500" => "#a855f7",
        "yellow-500" => "#eab308",
        "red-500" => "#ef4444",
        "blue-500" => "#3b82f6",
        "gray-600" => "#4b5563",
        "green-500" => "#22c55e",
        "green-600" => "#16a34a",
        "green-700" => "#15803d",
        "brown-600" => "#92400e",
        "orange-500" => "#f97316",
        "white" => "#ffffff",
        _ => FALLBACK_TINT,
    }
}
