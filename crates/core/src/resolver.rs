//! Alias and handler resolution.
//!
//! Type references in the settings are resolved against explicit tables that
//! are populated at startup: the [`ModelRegistry`] for record types and a
//! [`HandlerRegistry`] for admin handler factories. Nothing is loaded by name
//! at runtime, and [`ConfigurationResolver::validate`] lets the server refuse
//! to start when a configured reference has no registration behind it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CoreError;
use crate::registry::{is_tracking_type, split_reference, ModelDefinition, ModelRegistry};
use crate::settings::{TrackingSettings, DEFAULT_ALIAS};

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// Named factories, addressed by `"<namespace>.<TypeName>"` references.
#[derive(Debug, Clone)]
pub struct HandlerRegistry<F> {
    namespaces: BTreeMap<String, BTreeMap<String, F>>,
}

impl<F> HandlerRegistry<F> {
    pub fn new() -> Self {
        Self {
            namespaces: BTreeMap::new(),
        }
    }

    /// Register `factory` under `reference`, replacing any previous entry.
    pub fn register(&mut self, reference: &str, factory: F) -> Result<(), CoreError> {
        let (namespace, name) = split_reference(reference)?;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), factory);
        Ok(())
    }

    /// Look up the factory registered under `reference`.
    pub fn get(&self, reference: &str) -> Result<&F, CoreError> {
        let (namespace, name) = split_reference(reference)?;
        let factories = self.namespaces.get(namespace).ok_or_else(|| {
            CoreError::Resolution(format!("No handler namespace '{namespace}'"))
        })?;
        factories.get(name).ok_or_else(|| {
            CoreError::Resolution(format!("Handler namespace '{namespace}' has no type '{name}'"))
        })
    }
}

impl<F> Default for HandlerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ConfigurationResolver
// ---------------------------------------------------------------------------

/// Resolves model aliases and the admin handler from [`TrackingSettings`].
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    settings: Arc<TrackingSettings>,
    models: Arc<ModelRegistry>,
}

impl ConfigurationResolver {
    pub fn new(settings: Arc<TrackingSettings>, models: Arc<ModelRegistry>) -> Self {
        Self { settings, models }
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Resolve a model alias to its record type.
    ///
    /// - Unknown alias: [`CoreError::Configuration`].
    /// - Alias mapped to nothing: [`CoreError::Resolution`].
    /// - Malformed reference: [`CoreError::Configuration`].
    /// - Namespace or type not registered: [`CoreError::Resolution`].
    /// - Registered type that does not hold tracking records: [`CoreError::Resolution`].
    pub fn resolve_model(&self, alias: &str) -> Result<&ModelDefinition, CoreError> {
        let reference = self.settings.models.get(alias).ok_or_else(|| {
            CoreError::Configuration(format!("Unknown tracking model alias '{alias}'"))
        })?;
        let reference = reference.as_deref().ok_or_else(|| {
            CoreError::Resolution(format!("No tracking model configured for alias '{alias}'"))
        })?;
        let model = self.models.get_by_reference(reference)?;
        if !is_tracking_type(model) {
            return Err(CoreError::Resolution(format!(
                "{} is not a tracking record type (alias '{alias}')",
                model.reference()
            )));
        }
        Ok(model)
    }

    /// Resolve the configured admin handler to its factory.
    pub fn resolve_admin_handler<'h, F>(
        &self,
        handlers: &'h HandlerRegistry<F>,
    ) -> Result<&'h F, CoreError> {
        handlers.get(&self.settings.admin_handler)
    }

    /// Check every configured reference up front.
    ///
    /// When tracking is enabled the default alias must resolve. Every other
    /// alias that names a type must resolve too, and so must the admin handler.
    pub fn validate<F>(&self, handlers: &HandlerRegistry<F>) -> Result<(), CoreError> {
        if self.settings.enabled {
            self.resolve_model(DEFAULT_ALIAS)?;
        }
        for (alias, reference) in &self.settings.models {
            if reference.is_some() {
                self.resolve_model(alias)?;
            }
        }
        self.resolve_admin_handler(handlers)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
