//! Built-in plugin that publishes a file by copying it into a publish folder

use super::{Acceptance, PublishItem, PublishPlugin, Validation};
use crate::types::{Setting, SettingKind, Settings};
use anyhow::{Context, bail};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Setting naming the destination folder
pub const PUBLISH_FOLDER: &str = "Publish Folder";
/// Setting allowing an existing published file to be replaced
pub const OVERWRITE: &str = "Overwrite";

/// Copies an item's `path` property into the configured publish folder
#[derive(Debug, Clone)]
pub struct CopyFilePlugin {
    filters: Vec<String>,
    default_folder: Option<PathBuf>,
}

impl CopyFilePlugin {
    /// Create the plugin for items matching `filters`
    pub fn new(filters: &[&str]) -> Self {
        Self {
            filters: filters.iter().map(ToString::to_string).collect(),
            default_folder: None,
        }
    }

    /// Default value of the publish folder setting
    #[must_use]
    pub fn with_publish_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.default_folder = Some(folder.into());
        self
    }

    fn source(item: &PublishItem) -> Option<PathBuf> {
        item.properties
            .get("path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    fn destination(settings: &Settings, source: &Path) -> Option<PathBuf> {
        let folder = settings
            .get(PUBLISH_FOLDER)
            .and_then(|s| s.value.as_str())
            .filter(|s| !s.trim().is_empty())?;
        Some(Path::new(folder).join(source.file_name()?))
    }

    fn overwrite(settings: &Settings) -> bool {
        settings
            .get(OVERWRITE)
            .and_then(|s| s.value.as_bool())
            .unwrap_or(false)
    }
}

impl PublishPlugin for CopyFilePlugin {
    fn name(&self) -> &str {
        "Copy File"
    }

    fn icon(&self) -> Option<&str> {
        Some("file")
    }

    fn item_filters(&self) -> Vec<String> {
        self.filters.clone()
    }

    fn settings(&self) -> Settings {
        let folder = self
            .default_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        Settings::from([
            (
                PUBLISH_FOLDER.to_string(),
                Setting::new(folder, SettingKind::Path)
                    .described("Folder the file is copied into"),
            ),
            (
                OVERWRITE.to_string(),
                Setting::new(false, SettingKind::Bool)
                    .described("Replace a previously published file"),
            ),
        ])
    }

    fn accept(&self, _settings: &Settings, item: &mut PublishItem) -> Acceptance {
        if Self::source(item).is_some() {
            Acceptance::accepted(true)
        } else {
            debug!("{}: no path property, not accepting", item.name);
            Acceptance::rejected()
        }
    }

    fn validate(&self, settings: &Settings, item: &mut PublishItem) -> anyhow::Result<Validation> {
        let Some(source) = Self::source(item) else {
            return Ok(Validation::fail("item has no path"));
        };
        if !source.is_file() {
            return Ok(Validation::fail(format!(
                "source file not found: {}",
                source.display()
            )));
        }
        let Some(destination) = Self::destination(settings, &source) else {
            return Ok(Validation::fail("no publish folder configured"));
        };
        if destination.exists() && !Self::overwrite(settings) {
            return Ok(Validation::fail(format!(
                "already published: {}",
                destination.display()
            )));
        }

        item.properties.insert(
            "publish_path".to_string(),
            Value::String(destination.display().to_string()),
        );
        Ok(Validation::pass())
    }

    fn publish(&self, settings: &Settings, item: &mut PublishItem) -> anyhow::Result<()> {
        let Some(source) = Self::source(item) else {
            bail!("item {} has no path", item.name);
        };
        let Some(destination) = Self::destination(settings, &source) else {
            bail!("no publish folder configured for {}", item.name);
        };
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::copy(&source, &destination).with_context(|| {
            format!("copying {} to {}", source.display(), destination.display())
        })?;
        debug!("Copied {} to {}", source.display(), destination.display());
        Ok(())
    }

    fn finalize(
        &self,
        settings: &Settings,
        item: &mut PublishItem,
    ) -> anyhow::Result<Option<String>> {
        let Some(destination) =
            Self::source(item).and_then(|source| Self::destination(settings, &source))
        else {
            return Ok(Some("nothing was published".to_string()));
        };
        if !destination.is_file() {
            return Ok(Some(format!(
                "published file missing: {}",
                destination.display()
            )));
        }
        item.properties.insert(
            "published_path".to_string(),
            Value::String(destination.display().to_string()),
        );
        item.properties.insert(
            "published_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Ok(None)
    }

    fn has_custom_ui(&self) -> bool {
        true
    }
}
