//! Asset cache: memoized decorative-item images keyed by `asset_key`.
//!
//! The first `resolve` of a key starts a load through an [`AssetLoader`] and
//! returns `None`; the renderer draws the emoji fallback until the loader
//! reports completion through [`AssetCache::finish`]. Entries are never
//! evicted. A failed load is remembered as failed and never retried, so a
//! missing image costs one request per session.

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::HtmlImageElement;

use crate::catalog::{Catalog, DecorativeItemKind};
use crate::config::join_asset_url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("could not start loading {url}: {reason}")]
    Start { url: String, reason: String },
    #[error("image failed to load: {url}")]
    Load { url: String },
}

/// Starts asynchronous image loads. Completion is reported back later.
pub trait AssetLoader {
    /// Begin loading `url` for cache key `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Start`] if the load could not even be issued.
    fn start(&mut self, key: &str, url: &str) -> Result<(), AssetError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Missing,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug)]
enum Slot<H> {
    Loading,
    Ready(H),
    Failed,
}

#[derive(Debug)]
pub struct AssetCache<H> {
    base_url: String,
    slots: HashMap<String, Slot<H>>,
}

impl<H> AssetCache<H> {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), slots: HashMap::new() }
    }

    /// Drawable handle for `kind`, starting a load on first request.
    pub fn resolve(&mut self, kind: &DecorativeItemKind, loader: &mut impl AssetLoader) -> Option<&H> {
        let key = kind.asset_key.as_deref()?;
        if !self.slots.contains_key(key) {
            self.request(key, loader);
        }
        self.get(key)
    }

    /// Drawable handle for an asset key without triggering a load.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&H> {
        match self.slots.get(key) {
            Some(Slot::Ready(handle)) => Some(handle),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self, key: &str) -> AssetState {
        match self.slots.get(key) {
            None => AssetState::Missing,
            Some(Slot::Loading) => AssetState::Loading,
            Some(Slot::Ready(_)) => AssetState::Ready,
            Some(Slot::Failed) => AssetState::Failed,
        }
    }

    /// Start loading every asset the catalog names.
    pub fn prefetch(&mut self, catalog: &Catalog, loader: &mut impl AssetLoader) {
        for kind in catalog.iter() {
            self.resolve(kind, loader);
        }
    }

    /// Record the outcome of a load started by [`AssetCache::resolve`].
    pub fn finish(&mut self, key: &str, result: Result<H, AssetError>) {
        let slot = match result {
            Ok(handle) => Slot::Ready(handle),
            Err(err) => {
                tracing::debug!(error = %err, key, "asset unavailable, using fallback");
                Slot::Failed
            }
        };
        self.slots.insert(key.to_owned(), slot);
    }

    fn request(&mut self, key: &str, loader: &mut impl AssetLoader) {
        let url = join_asset_url(&self.base_url, key);
        let slot = match loader.start(key, &url) {
            Ok(()) => Slot::Loading,
            Err(err) => {
                tracing::debug!(error = %err, key, "asset load not started");
                Slot::Failed
            }
        };
        self.slots.insert(key.to_owned(), slot);
    }
}

// =============================================================
// Browser loader
// =============================================================

type Completions = Rc<RefCell<Vec<(String, Result<HtmlImageElement, AssetError>)>>>;

/// Loads images with `HtmlImageElement`; `onload`/`onerror` push into a
/// queue that the engine drains once per frame.
#[derive(Default)]
pub struct ImageLoader {
    completions: Completions,
}

impl ImageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every finished load into `cache`.
    pub fn drain_into(&self, cache: &mut AssetCache<HtmlImageElement>) {
        let done: Vec<_> = self.completions.borrow_mut().drain(..).collect();
        for (key, result) in done {
            cache.finish(&key, result);
        }
    }
}

impl AssetLoader for ImageLoader {
    fn start(&mut self, key: &str, url: &str) -> Result<(), AssetError> {
        let img = HtmlImageElement::new()
            .map_err(|e| AssetError::Start { url: url.to_owned(), reason: format!("{e:?}") })?;

        let on_load = {
            let completions = Rc::clone(&self.completions);
            let key = key.to_owned();
            let img = img.clone();
            Closure::once_into_js(move || completions.borrow_mut().push((key, Ok(img))))
        };
        let on_error = {
            let completions = Rc::clone(&self.completions);
            let key = key.to_owned();
            let url = url.to_owned();
            Closure::once_into_js(move || completions.borrow_mut().push((key, Err(AssetError::Load { url }))))
        };
        img.set_onload(Some(on_load.unchecked_ref()));
        img.set_onerror(Some(on_error.unchecked_ref()));
        img.set_src(url);
        Ok(())
    }
}
