//! Store routing for record types.
//!
//! [`DatabaseRouter`] sends every record type whose grouping label belongs to
//! a tracking type to the tracking store. It holds an immutable snapshot of
//! the labels taken from the [`ModelRegistry`] at construction time; types
//! registered later are only seen after [`DatabaseRouter::refresh`].
//!
//! Routers answer `None` when they have no opinion. [`RouterChain`] asks each
//! router in turn and applies the defaults when all of them defer.

use std::collections::BTreeSet;

use crate::registry::{ModelDefinition, ModelRegistry};

/// Alias of the store used when no router claims a record type.
pub const DEFAULT_STORE: &str = "default";

/// A routing policy consulted per read, write, relation and migration.
pub trait StoreRouting: Send + Sync {
    /// Store to read `model` rows from, or `None` to defer.
    fn route_read(&self, model: &ModelDefinition) -> Option<&str>;

    /// Store to write `model` rows to, or `None` to defer.
    fn route_write(&self, model: &ModelDefinition) -> Option<&str>;

    /// Whether rows of `a` and `b` may reference each other, or `None` to defer.
    fn allow_relation(&self, a: &ModelDefinition, b: &ModelDefinition) -> Option<bool>;

    /// Whether tables of `grouping_label` may be created in `store`, or `None`
    /// to defer.
    fn allow_migrate(&self, store: &str, grouping_label: &str) -> Option<bool>;
}

// ---------------------------------------------------------------------------
// DatabaseRouter
// ---------------------------------------------------------------------------

/// Routes tracking record types to a dedicated store.
#[derive(Debug, Clone)]
pub struct DatabaseRouter {
    store_alias: String,
    tracking_labels: BTreeSet<String>,
}

impl DatabaseRouter {
    /// Snapshot the grouping labels of every tracking type in `registry`.
    ///
    /// An empty registry yields a router that defers on everything.
    pub fn new(store_alias: impl Into<String>, registry: &ModelRegistry) -> Self {
        Self {
            store_alias: store_alias.into(),
            tracking_labels: registry.tracking_labels(),
        }
    }

    /// Re-snapshot the tracking labels after types were registered.
    pub fn refresh(&mut self, registry: &ModelRegistry) {
        self.tracking_labels = registry.tracking_labels();
    }

    pub fn store_alias(&self) -> &str {
        &self.store_alias
    }

    pub fn tracking_labels(&self) -> &BTreeSet<String> {
        &self.tracking_labels
    }

    fn is_in_tracking_group(&self, model: &ModelDefinition) -> bool {
        self.tracking_labels.contains(model.grouping_label())
    }
}

impl StoreRouting for DatabaseRouter {
    fn route_read(&self, model: &ModelDefinition) -> Option<&str> {
        self.is_in_tracking_group(model)
            .then_some(self.store_alias.as_str())
    }

    fn route_write(&self, model: &ModelDefinition) -> Option<&str> {
        self.route_read(model)
    }

    fn allow_relation(&self, a: &ModelDefinition, b: &ModelDefinition) -> Option<bool> {
        (self.is_in_tracking_group(a) && self.is_in_tracking_group(b)).then_some(true)
    }

    /// Decisive inside the tracked set so tracking tables exist in exactly
    /// one store; deferring outside it.
    fn allow_migrate(&self, store: &str, grouping_label: &str) -> Option<bool> {
        self.tracking_labels
            .contains(grouping_label)
            .then(|| store == self.store_alias)
    }
}

// ---------------------------------------------------------------------------
// RouterChain
// ---------------------------------------------------------------------------

/// Ordered list of routers with fallback defaults.
///
/// When every router defers: reads and writes go to the default store,
/// relations are allowed iff both types are written to the same store, and
/// migrations are allowed.
pub struct RouterChain {
    routers: Vec<Box<dyn StoreRouting>>,
    default_store: String,
}

impl RouterChain {
    pub fn new() -> Self {
        Self {
            routers: Vec::new(),
            default_store: DEFAULT_STORE.to_string(),
        }
    }

    /// Append a router; earlier routers take precedence.
    pub fn with_router(mut self, router: impl StoreRouting + 'static) -> Self {
        self.routers.push(Box::new(router));
        self
    }

    pub fn default_store(&self) -> &str {
        &self.default_store
    }

    pub fn route_read(&self, model: &ModelDefinition) -> &str {
        self.routers
            .iter()
            .find_map(|r| r.route_read(model))
            .unwrap_or(self.default_store.as_str())
    }

    pub fn route_write(&self, model: &ModelDefinition) -> &str {
        self.routers
            .iter()
            .find_map(|r| r.route_write(model))
            .unwrap_or(self.default_store.as_str())
    }

    pub fn allow_relation(&self, a: &ModelDefinition, b: &ModelDefinition) -> bool {
        self.routers
            .iter()
            .find_map(|r| r.allow_relation(a, b))
            .unwrap_or_else(|| self.route_write(a) == self.route_write(b))
    }

    pub fn allow_migrate(&self, store: &str, grouping_label: &str) -> bool {
        self.routers
            .iter()
            .find_map(|r| r.allow_migrate(store, grouping_label))
            .unwrap_or(true)
    }
}

impl Default for RouterChain {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
