//! Mock publish plugin for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use anyhow::bail;
use pubflow::context::CancelToken;
use pubflow::plugin::{PublishItem, PublishPlugin, Validation};
use pubflow::selection::{MultiEditUnsupported, SettingsForm};
use pubflow::types::{Phase, SettingValues, Settings, setting_values};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for one plugin hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCall {
    pub phase: Phase,
    pub item: String,
    pub description: Option<String>,
}

/// Simple mock plugin for testing
///
/// Features:
/// - Call tracking for verification
/// - Error injection per item and phase
/// - Cancellation after a number of calls
/// - Optional settings form, with or without multi-task editing
pub struct MockPlugin {
    name: String,
    filters: Vec<String>,
    settings: Settings,
    custom_ui: bool,
    multi_edit: bool,
    calls: Mutex<Vec<PluginCall>>,
    validated_settings: Mutex<Vec<(String, SettingValues)>>,
    forms_created: Mutex<usize>,
    // Error injection
    validate_failures: Mutex<HashMap<String, String>>,
    publish_errors: Mutex<HashMap<String, String>>,
    finalize_messages: Mutex<HashMap<String, String>>,
    finalize_errors: Mutex<HashMap<String, String>>,
    cancel_after: Mutex<Option<(usize, CancelToken)>>,
}

impl MockPlugin {
    /// Create a mock accepting every item type
    pub fn new(name: &str) -> Self {
        Self::with_filters(name, &["*"])
    }

    /// Create a mock accepting items matching `filters`
    pub fn with_filters(name: &str, filters: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            filters: filters.iter().map(ToString::to_string).collect(),
            settings: Settings::new(),
            custom_ui: false,
            multi_edit: true,
            calls: Mutex::new(Vec::new()),
            validated_settings: Mutex::new(Vec::new()),
            forms_created: Mutex::new(0),
            validate_failures: Mutex::new(HashMap::new()),
            publish_errors: Mutex::new(HashMap::new()),
            finalize_messages: Mutex::new(HashMap::new()),
            finalize_errors: Mutex::new(HashMap::new()),
            cancel_after: Mutex::new(None),
        }
    }

    /// Default settings for every task
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Expose a settings form; `multi_edit` false refuses selections of
    /// more than one task
    #[must_use]
    pub fn with_custom_ui(mut self, multi_edit: bool) -> Self {
        self.custom_ui = true;
        self.multi_edit = multi_edit;
        self
    }

    // === Error injection methods ===

    /// Make `validate` report a failure for `item`
    pub fn fail_validate(&self, item: &str, msg: &str) {
        self.validate_failures
            .lock()
            .unwrap()
            .insert(item.to_string(), msg.to_string());
    }

    /// Make `publish` return an error for `item`
    pub fn fail_publish(&self, item: &str, msg: &str) {
        self.publish_errors
            .lock()
            .unwrap()
            .insert(item.to_string(), msg.to_string());
    }

    /// Make `finalize` report a non-fatal error for `item`
    pub fn finalize_message(&self, item: &str, msg: &str) {
        self.finalize_messages
            .lock()
            .unwrap()
            .insert(item.to_string(), msg.to_string());
    }

    /// Make `finalize` return an error for `item`
    pub fn fail_finalize(&self, item: &str, msg: &str) {
        self.finalize_errors
            .lock()
            .unwrap()
            .insert(item.to_string(), msg.to_string());
    }

    /// Flag `cancel` once `calls` hooks have run
    pub fn cancel_after(&self, calls: usize, cancel: CancelToken) {
        *self.cancel_after.lock().unwrap() = Some((calls, cancel));
    }

    // === Call verification methods ===

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<PluginCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Value of `key` in the settings `item` was last validated with
    pub fn validated_setting(&self, item: &str, key: &str) -> Option<serde_json::Value> {
        self.validated_settings
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == item)
            .and_then(|(_, values)| values.get(key).cloned())
    }

    /// Number of settings forms built
    pub fn forms_created(&self) -> usize {
        *self.forms_created.lock().unwrap()
    }

    /// Items seen by `phase`, in call order
    pub fn items_for(&self, phase: Phase) -> Vec<String> {
        self.get_calls()
            .into_iter()
            .filter(|c| c.phase == phase)
            .map(|c| c.item)
            .collect()
    }

    /// Assert that `phase` ran for exactly `items`, in order
    pub fn assert_visited(&self, phase: Phase, items: &[&str]) {
        let seen = self.items_for(phase);
        assert_eq!(
            seen, items,
            "Expected {phase} calls for {items:?} but got: {seen:?}"
        );
    }

    fn track(&self, phase: Phase, item: &PublishItem) {
        let mut calls = self.calls.lock().unwrap();
        calls.push(PluginCall {
            phase,
            item: item.name.clone(),
            description: item.description.clone(),
        });
        if let Some((limit, cancel)) = self.cancel_after.lock().unwrap().as_ref() {
            if calls.len() >= *limit {
                cancel.cancel();
            }
        }
    }

    fn injected(map: &Mutex<HashMap<String, String>>, item: &PublishItem) -> Option<String> {
        map.lock().unwrap().get(&item.name).cloned()
    }
}

impl PublishPlugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn item_filters(&self) -> Vec<String> {
        self.filters.clone()
    }

    fn settings(&self) -> Settings {
        self.settings.clone()
    }

    fn validate(&self, settings: &Settings, item: &mut PublishItem) -> anyhow::Result<Validation> {
        self.track(Phase::Validate, item);
        self.validated_settings
            .lock()
            .unwrap()
            .push((item.name.clone(), setting_values(settings)));
        match Self::injected(&self.validate_failures, item) {
            Some(msg) => Ok(Validation::fail(msg)),
            None => Ok(Validation::pass()),
        }
    }

    fn publish(&self, _settings: &Settings, item: &mut PublishItem) -> anyhow::Result<()> {
        self.track(Phase::Publish, item);
        if let Some(msg) = Self::injected(&self.publish_errors, item) {
            bail!(msg);
        }
        item.properties
            .insert("published".to_string(), serde_json::Value::Bool(true));
        Ok(())
    }

    fn finalize(
        &self,
        _settings: &Settings,
        item: &mut PublishItem,
    ) -> anyhow::Result<Option<String>> {
        self.track(Phase::Finalize, item);
        if let Some(msg) = Self::injected(&self.finalize_errors, item) {
            bail!(msg);
        }
        Ok(Self::injected(&self.finalize_messages, item))
    }

    fn has_custom_ui(&self) -> bool {
        self.custom_ui
    }

    fn create_settings_form(&self, _items: &[PublishItem]) -> SettingsForm {
        *self.forms_created.lock().unwrap() += 1;
        SettingsForm::default()
    }

    fn set_ui_settings(
        &self,
        form: &mut SettingsForm,
        settings: &[SettingValues],
        _items: &[PublishItem],
    ) -> Result<(), MultiEditUnsupported> {
        if !self.multi_edit && settings.len() > 1 {
            return Err(MultiEditUnsupported);
        }
        form.merge(settings);
        Ok(())
    }
}
