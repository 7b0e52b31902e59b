//! Core types for pubflow

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Free-form property bag carried by every node; opaque to the orchestrator
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Per-task plugin settings by name
pub type Settings = BTreeMap<String, Setting>;

/// Plain setting values by name, as exchanged with a settings form
pub type SettingValues = BTreeMap<String, serde_json::Value>;

/// Stable identity of a node within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Index of the node in the tree's arena
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Collecting items from the session and external files
    Load,
    /// Checking every task can be published
    Validate,
    /// Performing the publish
    Publish,
    /// Post-publish cleanup and reporting
    Finalize,
}

impl Phase {
    /// Verb used in progress labels ("Validating: plate")
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Load => "Collecting",
            Self::Validate => "Validating",
            Self::Publish => "Publishing",
            Self::Finalize => "Finalizing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Validate => write!(f, "validation"),
            Self::Publish => write!(f, "publish"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// Per-node processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Not processed in the current run
    #[default]
    Ready,
    /// Passed a standalone validation pass
    ValidatedStandalone,
    /// Passed validation as part of a publish run
    Validated,
    /// Failed validation
    ValidationError,
    /// Published successfully
    Published,
    /// Publish raised
    PublishError,
    /// Finalized successfully
    Finalized,
    /// Finalize raised or reported an error
    FinalizeError,
}

impl Status {
    /// Whether this status reports a failure
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::ValidationError | Self::PublishError | Self::FinalizeError
        )
    }

    /// Severity of an error status; zero for non-errors
    pub const fn severity(self) -> u8 {
        match self {
            Self::ValidationError => 1,
            Self::PublishError => 2,
            Self::FinalizeError => 3,
            _ => 0,
        }
    }

    /// Status recorded when a node passes `phase`
    pub const fn success(phase: Phase, standalone: bool) -> Self {
        match phase {
            Phase::Load => Self::Ready,
            Phase::Validate if standalone => Self::ValidatedStandalone,
            Phase::Validate => Self::Validated,
            Phase::Publish => Self::Published,
            Phase::Finalize => Self::Finalized,
        }
    }

    /// Status recorded when a node fails `phase`
    pub const fn failure(phase: Phase) -> Self {
        match phase {
            Phase::Load | Phase::Validate => Self::ValidationError,
            Phase::Publish => Self::PublishError,
            Phase::Finalize => Self::FinalizeError,
        }
    }
}

/// Task/entity link of a context node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextLink {
    /// Linked entity (shot, asset, ...)
    #[serde(default)]
    pub entity: Option<String>,
    /// Linked pipeline task
    #[serde(default)]
    pub task: Option<String>,
}

impl ContextLink {
    /// Create a link to an entity and task
    pub fn new(entity: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            task: Some(task.into()),
        }
    }

    /// Link to an entity with no task selected
    pub fn entity_only(entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            task: None,
        }
    }

    /// Whether a non-empty task is linked
    pub fn has_task(&self) -> bool {
        self.task.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl fmt::Display for ContextLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.entity, &self.task) {
            (Some(entity), Some(task)) => write!(f, "{entity}, {task}"),
            (Some(entity), None) => write!(f, "{entity}"),
            (None, Some(task)) => write!(f, "{task}"),
            (None, None) => write!(f, "(no context)"),
        }
    }
}

/// Thumbnail image data shared between nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail(Arc<[u8]>);

impl Thumbnail {
    /// Wrap encoded image bytes
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Encoded image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Declared type of a plugin setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    /// Boolean toggle
    Bool,
    /// Integer value
    Int,
    /// Free text
    Str,
    /// Filesystem path
    Path,
    /// Path template name
    Template,
    /// List of values
    List,
}

/// One plugin setting on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Current value
    pub value: serde_json::Value,
    /// Declared type
    pub kind: SettingKind,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl Setting {
    /// Create a setting with a value and type
    pub fn new(value: impl Into<serde_json::Value>, kind: SettingKind) -> Self {
        Self {
            value: value.into(),
            kind,
            description: String::new(),
        }
    }

    /// Attach a description
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Snapshot the plain values of a settings map
pub fn setting_values(settings: &Settings) -> SettingValues {
    settings
        .iter()
        .map(|(k, s)| (k.clone(), s.value.clone()))
        .collect()
}
