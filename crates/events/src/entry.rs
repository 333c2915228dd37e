//! Administrative change-log entries.
//!
//! The host reports administrative changes as entries implementing
//! [`ChangeLogEntry`]. [`AdminLogEntry`] is the concrete entry type carried on
//! the [`AdminEventBus`](crate::bus::AdminEventBus) and accepted over HTTP.

use std::fmt;

use actionlog_core::admin::{classify, Classification};
use actionlog_core::error::CoreError;
use serde::{Deserialize, Serialize};

/// A record of one administrative create, update or delete.
pub trait ChangeLogEntry: Send + Sync {
    fn is_change(&self) -> bool;
    fn is_deletion(&self) -> bool;
    fn is_addition(&self) -> bool;

    /// Display form of the acting user.
    fn user(&self) -> String;

    /// The entity the change applied to.
    fn edited_object(&self) -> Result<EditedObject, CoreError>;

    fn change_message(&self) -> &str;

    fn classification(&self) -> Classification {
        classify(self.is_change(), self.is_deletion(), self.is_addition())
    }
}

// ---------------------------------------------------------------------------
// EditedObject
// ---------------------------------------------------------------------------

/// Snapshot of the entity an administrative change applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditedObject {
    /// `"<namespace>.<typename>"` of the entity.
    pub model: String,
    pub pk: serde_json::Value,
    /// Human-readable form, recorded as the tracking record's `object`.
    pub display: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Serialized form stored in the tracking record's `data`.
#[derive(Serialize)]
struct SerializedObject<'a> {
    model: &'a str,
    pk: &'a serde_json::Value,
    fields: &'a serde_json::Map<String, serde_json::Value>,
}

impl EditedObject {
    /// JSON snapshot: a one-element list of `{model, pk, fields}`.
    pub fn to_snapshot(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value([SerializedObject {
            model: &self.model,
            pk: &self.pk,
            fields: &self.fields,
        }])
    }
}

impl fmt::Display for EditedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// ---------------------------------------------------------------------------
// AdminLogEntry
// ---------------------------------------------------------------------------

/// Kind flag of an [`AdminLogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFlag {
    Addition,
    Change,
    Deletion,
}

/// A concrete administrative change-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub action_flag: ActionFlag,
    pub user: String,
    #[serde(default)]
    pub change_message: String,
    pub edited_object: Option<EditedObject>,
}

impl ChangeLogEntry for AdminLogEntry {
    fn is_change(&self) -> bool {
        self.action_flag == ActionFlag::Change
    }

    fn is_deletion(&self) -> bool {
        self.action_flag == ActionFlag::Deletion
    }

    fn is_addition(&self) -> bool {
        self.action_flag == ActionFlag::Addition
    }

    fn user(&self) -> String {
        self.user.clone()
    }

    fn edited_object(&self) -> Result<EditedObject, CoreError> {
        self.edited_object
            .clone()
            .ok_or_else(|| CoreError::Validation("Log entry has no edited object".into()))
    }

    fn change_message(&self) -> &str {
        &self.change_message
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use actionlog_core::admin::AdminActionKind;
    use serde_json::json;

    use super::*;

    fn widget() -> EditedObject {
        EditedObject {
            model: "catalog.widget".into(),
            pk: json!(42),
            display: "Widget#42".into(),
            fields: json!({"name": "Sprocket"}).as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn snapshot_is_single_element_list() {
        let snapshot = widget().to_snapshot().unwrap();
        assert_eq!(
            snapshot,
            json!([{"model": "catalog.widget", "pk": 42, "fields": {"name": "Sprocket"}}])
        );
    }

    #[test]
    fn flags_map_to_exactly_one_predicate() {
        for (flag, kind) in [
            (ActionFlag::Addition, AdminActionKind::Addition),
            (ActionFlag::Change, AdminActionKind::Change),
            (ActionFlag::Deletion, AdminActionKind::Deletion),
        ] {
            let entry = AdminLogEntry {
                action_flag: flag,
                user: "admin".into(),
                change_message: String::new(),
                edited_object: None,
            };
            let c = entry.classification();
            assert_eq!(c.kind, Some(kind));
            assert_eq!(c.matched, 1);
        }
    }

    #[test]
    fn entry_deserializes_from_json() {
        let entry: AdminLogEntry = serde_json::from_value(json!({
            "action_flag": "change",
            "user": "admin",
            "edited_object": {"model": "catalog.widget", "pk": 42, "display": "Widget#42"},
        }))
        .unwrap();
        assert!(entry.is_change());
        assert_eq!(entry.change_message(), "");
        assert_eq!(entry.edited_object().unwrap().to_string(), "Widget#42");
    }

    #[test]
    fn missing_edited_object_is_an_error() {
        let entry = AdminLogEntry {
            action_flag: ActionFlag::Deletion,
            user: "admin".into(),
            change_message: String::new(),
            edited_object: None,
        };
        assert!(entry.edited_object().is_err());
    }
}
