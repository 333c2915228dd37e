//! Tracking record entity and query parameters.
//!
//! Tracking records are append-only: there is no update DTO and no update or
//! delete path. `created` and `modified` are assigned by the store.

use std::fmt;

use actionlog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default page size for record listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Tracking record entity
// ---------------------------------------------------------------------------

/// A single tracked action. Immutable once created.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TrackingRecord {
    pub id: DbId,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub action: String,
    pub actor: String,
    pub object: String,
    pub target: String,
    pub description: String,
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for TrackingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.created, self.actor, self.action)
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filter and pagination for read-only listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingQuery {
    /// Case-insensitive substring matched against action, object, target,
    /// description and the JSON text of data.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TrackingQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// The search term, if any non-blank one was given.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// In-process equivalent of the SQL search filter.
    pub fn matches(&self, record: &TrackingRecord) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };
        let term = term.to_lowercase();
        let data_text = record
            .data
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        [
            record.action.as_str(),
            record.object.as_str(),
            record.target.as_str(),
            record.description.as_str(),
            data_text.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
