//! Conversion of caller-supplied action details into record fields.
//!
//! Callers submit a flat map of field name to value. Server-assigned fields
//! (`id`, `created`, `modified`) are dropped; any other key outside the record
//! schema, or a value of the wrong shape, is a validation failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::CoreError;
use crate::types::ActionDetails;

/// Upper bound, in characters, for every text field of a tracking record.
pub const MAX_FIELD_LENGTH: u64 = 256;

/// Text fields a caller may set.
pub const TEXT_FIELDS: &[&str] = &["action", "actor", "object", "target", "description"];

/// Structured field a caller may set.
pub const DATA_FIELD: &str = "data";

/// Fields owned by the store; ignored when present in details.
pub const SERVER_ASSIGNED_FIELDS: &[&str] = &["id", "created", "modified"];

/// Caller-settable fields of a tracking record, validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ActionFields {
    #[validate(length(max = MAX_FIELD_LENGTH))]
    pub action: String,
    #[validate(length(max = MAX_FIELD_LENGTH))]
    pub actor: String,
    #[validate(length(max = MAX_FIELD_LENGTH))]
    pub object: String,
    #[validate(length(max = MAX_FIELD_LENGTH))]
    pub target: String,
    #[validate(length(max = MAX_FIELD_LENGTH))]
    pub description: String,
    pub data: Option<Value>,
}

impl ActionFields {
    /// Build and validate fields from a details map.
    pub fn from_details(details: &ActionDetails) -> Result<Self, CoreError> {
        let mut fields = Self::default();

        for (key, value) in details {
            match key.as_str() {
                "action" => fields.action = text_value(key, value)?,
                "actor" => fields.actor = text_value(key, value)?,
                "object" => fields.object = text_value(key, value)?,
                "target" => fields.target = text_value(key, value)?,
                "description" => fields.description = text_value(key, value)?,
                DATA_FIELD => {
                    fields.data = match value {
                        Value::Null => None,
                        other => Some(other.clone()),
                    }
                }
                k if SERVER_ASSIGNED_FIELDS.contains(&k) => {}
                other => {
                    return Err(CoreError::Validation(format!(
                        "'{other}' is not a field of a tracking record"
                    )));
                }
            }
        }

        fields.check_lengths()?;
        Ok(fields)
    }

    /// Validate the length limits.
    pub fn check_lengths(&self) -> Result<(), CoreError> {
        Validate::validate(self).map_err(|errors| {
            let field_errors = errors.field_errors();
            let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
            fields.sort_unstable();
            CoreError::Validation(format!(
                "Fields exceed {MAX_FIELD_LENGTH} characters: {}",
                fields.join(", ")
            ))
        })
    }
}

/// Text fields accept strings; numbers and booleans are stringified.
fn text_value(key: &str, value: &Value) -> Result<String, CoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(CoreError::Validation(format!("'{key}' must not be null"))),
        Value::Array(_) | Value::Object(_) => Err(CoreError::Validation(format!(
            "'{key}' must be a string, got structured JSON"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn details(value: Value) -> ActionDetails {
        match value {
            Value::Object(map) => map,
            _ => panic!("details must be an object"),
        }
    }

    #[test]
    fn copies_known_fields() {
        let fields = ActionFields::from_details(&details(json!({
            "action": "created widget",
            "actor": "alice",
            "object": "Widget#42",
            "target": "catalog",
            "description": "first widget",
            "data": {"color": "red"},
        })))
        .unwrap();

        assert_eq!(fields.action, "created widget");
        assert_eq!(fields.actor, "alice");
        assert_eq!(fields.object, "Widget#42");
        assert_eq!(fields.target, "catalog");
        assert_eq!(fields.description, "first widget");
        assert_eq!(fields.data, Some(json!({"color": "red"})));
    }

    #[test]
    fn missing_fields_default_to_blank() {
        let fields = ActionFields::from_details(&details(json!({"action": "x"}))).unwrap();
        assert_eq!(fields.actor, "");
        assert_eq!(fields.data, None);
    }

    #[test]
    fn server_assigned_fields_are_ignored() {
        let fields = ActionFields::from_details(&details(json!({
            "action": "x",
            "id": 99,
            "created": "2001-01-01T00:00:00Z",
            "modified": "2001-01-01T00:00:00Z",
        })))
        .unwrap();
        assert_eq!(fields.action, "x");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ActionFields::from_details(&details(json!({"colour": "red"}))).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("colour"));
    }

    #[test]
    fn overlong_text_is_rejected() {
        let long = "x".repeat(257);
        let err = ActionFields::from_details(&details(json!({"description": long}))).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("description"));
    }

    #[test]
    fn every_text_field_is_limited_to_max_length() {
        let limit = MAX_FIELD_LENGTH as usize;
        for field in TEXT_FIELDS {
            let at_limit = ActionDetails::from_iter([(field.to_string(), json!("x".repeat(limit)))]);
            assert!(ActionFields::from_details(&at_limit).is_ok(), "{field} at limit");

            let over = ActionDetails::from_iter([(field.to_string(), json!("x".repeat(limit + 1)))]);
            assert_matches!(
                ActionFields::from_details(&over),
                Err(CoreError::Validation(msg)) if msg.contains(field)
            );
        }
    }

    #[test]
    fn length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_FIELD_LENGTH as usize);
        assert!(ActionFields::from_details(&details(json!({"action": at_limit}))).is_ok());
    }

    #[test]
    fn scalars_are_stringified() {
        let fields =
            ActionFields::from_details(&details(json!({"object": 42, "target": true}))).unwrap();
        assert_eq!(fields.object, "42");
        assert_eq!(fields.target, "true");
    }

    #[test]
    fn structured_or_null_text_is_rejected() {
        assert_matches!(
            ActionFields::from_details(&details(json!({"actor": null}))),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            ActionFields::from_details(&details(json!({"object": {"id": 1}}))),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn data_accepts_any_shape() {
        for data in [json!([1, 2]), json!("text"), json!(3.5), json!({"a": {"b": []}})] {
            let fields = ActionFields::from_details(&details(json!({"data": data.clone()}))).unwrap();
            assert_eq!(fields.data, Some(data));
        }
        let fields = ActionFields::from_details(&details(json!({"data": null}))).unwrap();
        assert_eq!(fields.data, None);
    }
}
