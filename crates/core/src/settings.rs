//! Process-wide tracking settings.
//!
//! Loaded once at startup and read-only afterwards. There is no mutation API;
//! a changed environment only takes effect after a restart.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::registry::IDENT_RE;

/// Alias that every tracking call falls back to when none is given.
pub const DEFAULT_ALIAS: &str = "default";

/// Store alias reserved for tracking record types.
pub const DEFAULT_DATABASE_ALIAS: &str = "tracking";

/// Reference to the built-in admin tracking handler.
pub const DEFAULT_ADMIN_HANDLER: &str = "actionlog.AdminTrackingHandler";

/// Record type the server registers when nothing else is configured.
pub const DEFAULT_REGISTERED_MODEL: &str = "actionlog.ActionLog";

/// Tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Global switch. When `false` every tracking call is a silent no-op.
    pub enabled: bool,
    /// Model alias -> `"<namespace>.<TypeName>"`. `None` means "not configured".
    pub models: BTreeMap<String, Option<String>>,
    /// Store alias that tracking record types are routed to.
    pub database_alias: String,
    /// Reference to the admin handler factory.
    pub admin_handler: String,
    /// Whether the admin event listener surfaces tracking failures to the
    /// caller instead of logging them.
    pub propagate_listener_errors: bool,
    /// Trackable record types registered by the server at startup.
    pub registered_models: Vec<String>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            models: BTreeMap::from([(DEFAULT_ALIAS.to_string(), None)]),
            database_alias: DEFAULT_DATABASE_ALIAS.to_string(),
            admin_handler: DEFAULT_ADMIN_HANDLER.to_string(),
            propagate_listener_errors: false,
            registered_models: vec![DEFAULT_REGISTERED_MODEL.to_string()],
        }
    }
}

impl TrackingSettings {
    /// Load settings from environment variables.
    ///
    /// | Env Var                              | Default                          |
    /// |--------------------------------------|----------------------------------|
    /// | `TRACKING_ENABLED`                   | `true`                           |
    /// | `TRACKING_MODELS`                    | `default=`                       |
    /// | `TRACKING_DATABASE_ALIAS`            | `tracking`                       |
    /// | `TRACKING_ADMIN_HANDLER`             | `actionlog.AdminTrackingHandler` |
    /// | `TRACKING_LISTENER_PROPAGATE_ERRORS` | `false`                          |
    /// | `TRACKING_REGISTERED_MODELS`         | `actionlog.ActionLog`            |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = match lookup("TRACKING_ENABLED") {
            Some(raw) => parse_bool("TRACKING_ENABLED", &raw)?,
            None => defaults.enabled,
        };

        let models = match lookup("TRACKING_MODELS") {
            Some(raw) => parse_models(&raw)?,
            None => defaults.models,
        };

        let database_alias = match lookup("TRACKING_DATABASE_ALIAS") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(CoreError::Configuration(
                    "TRACKING_DATABASE_ALIAS must not be empty".into(),
                ));
            }
            Some(raw) => raw.trim().to_string(),
            None => defaults.database_alias,
        };

        let admin_handler = match lookup("TRACKING_ADMIN_HANDLER") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(CoreError::Configuration(
                    "TRACKING_ADMIN_HANDLER must not be empty".into(),
                ));
            }
            Some(raw) => raw.trim().to_string(),
            None => defaults.admin_handler,
        };

        let propagate_listener_errors = match lookup("TRACKING_LISTENER_PROPAGATE_ERRORS") {
            Some(raw) => parse_bool("TRACKING_LISTENER_PROPAGATE_ERRORS", &raw)?,
            None => defaults.propagate_listener_errors,
        };

        let registered_models = match lookup("TRACKING_REGISTERED_MODELS") {
            Some(raw) => split_list(&raw),
            None => defaults.registered_models,
        };

        Ok(Self {
            enabled,
            models,
            database_alias,
            admin_handler,
            propagate_listener_errors,
            registered_models,
        })
    }

    /// Configured aliases other than [`DEFAULT_ALIAS`], in sorted order.
    pub fn extra_aliases(&self) -> impl Iterator<Item = &str> {
        self.models
            .keys()
            .map(String::as_str)
            .filter(|alias| *alias != DEFAULT_ALIAS)
    }
}

/// Aliases whose endpoint paths would collide with the record query routes.
pub const RESERVED_ALIASES: &[&str] = &["records", "actions"];

fn parse_bool(key: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CoreError::Configuration(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `alias=namespace.TypeName` pairs separated by commas.
///
/// An empty right-hand side maps the alias to `None`.
fn parse_models(raw: &str) -> Result<BTreeMap<String, Option<String>>, CoreError> {
    let mut models = BTreeMap::new();
    for pair in split_list(raw) {
        let (alias, reference) = pair.split_once('=').ok_or_else(|| {
            CoreError::Configuration(format!(
                "TRACKING_MODELS entry '{pair}' must have the form alias=namespace.TypeName"
            ))
        })?;
        let alias = alias.trim();
        if !IDENT_RE.is_match(alias) {
            return Err(CoreError::Configuration(format!(
                "TRACKING_MODELS alias '{alias}' must be a letter or underscore followed by \
                 letters, digits or underscores"
            )));
        }
        if RESERVED_ALIASES.contains(&alias) {
            return Err(CoreError::Configuration(format!(
                "TRACKING_MODELS alias '{alias}' is reserved"
            )));
        }
        let reference = reference.trim();
        let value = (!reference.is_empty()).then(|| reference.to_string());
        if models.insert(alias.to_string(), value).is_some() {
            return Err(CoreError::Configuration(format!(
                "TRACKING_MODELS declares alias '{alias}' more than once"
            )));
        }
    }
    Ok(models)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
