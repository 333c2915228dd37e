/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A flat mapping of field name to value, as submitted by callers.
pub type ActionDetails = serde_json::Map<String, serde_json::Value>;
