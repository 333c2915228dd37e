//! Record type registry.
//!
//! Every record type the server knows about is registered here at startup,
//! keyed by its namespace (the grouping label) and type name. Types that hold
//! tracking records carry an explicit `trackable` marker; routing decisions
//! are derived from that marker rather than from how the type was declared.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Identifier accepted for namespaces, type names and model aliases.
pub(crate) static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Lower-case SQL identifier, within the PostgreSQL 63-byte limit.
static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Type references
// ---------------------------------------------------------------------------

/// Split a `"<namespace>.<TypeName>"` reference on its last separator.
pub fn split_reference(reference: &str) -> Result<(&str, &str), CoreError> {
    match reference.rsplit_once('.') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace, name))
        }
        _ => Err(CoreError::Configuration(format!(
            "Type reference '{reference}' must have the form <namespace>.<TypeName>"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Model definitions
// ---------------------------------------------------------------------------

/// Schema description of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    /// Grouping label, used for store routing.
    pub namespace: String,
    pub name: String,
    /// Physical table holding rows of this type.
    pub table: String,
    /// Capability marker: rows of this type are tracking records.
    pub trackable: bool,
}

impl ModelDefinition {
    /// A tracking record type with the conventional table name
    /// `<namespace>_<typename>` (both lower-cased).
    pub fn trackable(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace.into(), name.into(), true)
    }

    /// A record type that is not a tracking type.
    pub fn plain(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace.into(), name.into(), false)
    }

    /// Build a trackable definition from a `"<namespace>.<TypeName>"` reference.
    pub fn trackable_from_reference(reference: &str) -> Result<Self, CoreError> {
        let (namespace, name) = split_reference(reference)?;
        Ok(Self::trackable(namespace, name))
    }

    fn new(namespace: String, name: String, trackable: bool) -> Self {
        let table = format!(
            "{}_{}",
            namespace.to_ascii_lowercase(),
            name.to_ascii_lowercase()
        );
        Self {
            namespace,
            name,
            table,
            trackable,
        }
    }

    /// Override the conventional table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn grouping_label(&self) -> &str {
        &self.namespace
    }

    /// The `"<namespace>.<TypeName>"` reference for this type.
    pub fn reference(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if !IDENT_RE.is_match(&self.namespace) {
            return Err(CoreError::Configuration(format!(
                "Invalid namespace '{}'",
                self.namespace
            )));
        }
        if !IDENT_RE.is_match(&self.name) {
            return Err(CoreError::Configuration(format!(
                "Invalid type name '{}'",
                self.name
            )));
        }
        if !TABLE_RE.is_match(&self.table) {
            return Err(CoreError::Configuration(format!(
                "Invalid table name '{}' for {}",
                self.table,
                self.reference()
            )));
        }
        Ok(())
    }
}

/// Whether `model` holds tracking records.
pub fn is_tracking_type(model: &ModelDefinition) -> bool {
    model.trackable
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All registered record types, grouped by namespace.
///
/// Type names are matched case-insensitively within a namespace.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    namespaces: BTreeMap<String, BTreeMap<String, ModelDefinition>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of trackable types from `"<namespace>.<TypeName>"` references.
    pub fn from_references<'a>(
        references: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for reference in references {
            registry.register(ModelDefinition::trackable_from_reference(reference)?)?;
        }
        Ok(registry)
    }

    /// Register a record type.
    ///
    /// Fails if the definition is malformed, the type is already registered,
    /// or another type already owns the same table.
    pub fn register(&mut self, model: ModelDefinition) -> Result<(), CoreError> {
        model.validate()?;

        if let Some(existing) = self.models().find(|m| m.table == model.table) {
            return Err(CoreError::Configuration(format!(
                "Table '{}' is already used by {}",
                model.table,
                existing.reference()
            )));
        }

        let key = model.name.to_ascii_lowercase();
        let types = self.namespaces.entry(model.namespace.clone()).or_default();
        if types.contains_key(&key) {
            return Err(CoreError::Configuration(format!(
                "{} is already registered",
                model.reference()
            )));
        }
        types.insert(key, model);
        Ok(())
    }

    /// Look up a record type by namespace and name.
    pub fn get(&self, namespace: &str, name: &str) -> Result<&ModelDefinition, CoreError> {
        let types = self.namespaces.get(namespace).ok_or_else(|| {
            CoreError::Resolution(format!("No namespace registered with label '{namespace}'"))
        })?;
        types.get(&name.to_ascii_lowercase()).ok_or_else(|| {
            CoreError::Resolution(format!("Namespace '{namespace}' has no type '{name}'"))
        })
    }

    /// Look up a record type by its `"<namespace>.<TypeName>"` reference.
    pub fn get_by_reference(&self, reference: &str) -> Result<&ModelDefinition, CoreError> {
        let (namespace, name) = split_reference(reference)?;
        self.get(namespace, name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.namespaces.values().flat_map(|types| types.values())
    }

    /// Grouping labels of every registered tracking type.
    pub fn tracking_labels(&self) -> BTreeSet<String> {
        self.models()
            .filter(|m| is_tracking_type(m))
            .map(|m| m.grouping_label().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models().count()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
