//! Manifest collector
//!
//! Reads item descriptors from a TOML or JSON file:
//!
//! ```toml
//! [[items]]
//! name = "plate"
//! type = "file.image.sequence"
//! context = { entity = "sh010", task = "comp" }
//! properties = { path = "/renders/sh010/plate.exr" }
//! ```

use super::{Collector, ItemDescriptor};
use crate::error::Error;
use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    items: Vec<ItemDescriptor>,
}

/// Collector backed by a manifest file
#[derive(Debug, Clone)]
pub struct ManifestCollector {
    path: PathBuf,
    persistent: bool,
}

impl ManifestCollector {
    /// Collect from the manifest at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persistent: false,
        }
    }

    /// Mark every collected item as externally loaded
    #[must_use]
    pub const fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Manifest location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse manifest text; JSON when `path` ends in `.json`, TOML otherwise
    pub fn parse(path: &Path, text: &str) -> crate::error::Result<Vec<ItemDescriptor>> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let manifest: Manifest = if is_json {
            serde_json::from_str(text)?
        } else {
            toml::from_str(text)?
        };
        if manifest.items.is_empty() {
            return Err(Error::Collect(format!(
                "{} lists no items",
                path.display()
            )));
        }
        Ok(manifest.items)
    }
}

fn mark_persistent(items: &mut [ItemDescriptor]) {
    for item in items {
        item.persistent = true;
        mark_persistent(&mut item.children);
    }
}

impl Collector for ManifestCollector {
    fn collect(&self) -> anyhow::Result<Vec<ItemDescriptor>> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read manifest: {}", self.path.display()))?;
        let mut items = Self::parse(&self.path, &text)
            .with_context(|| format!("Failed to parse manifest: {}", self.path.display()))?;
        if self.persistent {
            mark_persistent(&mut items);
        }
        Ok(items)
    }
}
