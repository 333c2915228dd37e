//! Repository for tracking record tables.
//!
//! Every tracking record type owns one table with the same layout. Table
//! names come from registered [`ModelDefinition`]s, which only admit plain
//! lower-case identifiers, so they are safe to interpolate.

use actionlog_core::details::ActionFields;
use actionlog_core::registry::ModelDefinition;
use actionlog_core::types::DbId;
use sqlx::PgPool;

use crate::models::tracking::{TrackingQuery, TrackingRecord};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for SELECT / RETURNING.
const COLUMNS: &str = "\
    id, created, modified, action, actor, object, target, description, data";

/// Column list for INSERT (excludes store-assigned `id`, `created`, `modified`).
const INSERT_COLUMNS: &str = "action, actor, object, target, description, data";

// ---------------------------------------------------------------------------
// TrackingRecordRepo
// ---------------------------------------------------------------------------

/// Provides table creation, insert and read operations for tracking records.
pub struct TrackingRecordRepo;

impl TrackingRecordRepo {
    /// Create the table for `model` if it does not exist yet.
    pub async fn ensure_table(pool: &PgPool, model: &ModelDefinition) -> Result<(), sqlx::Error> {
        let table = &model.table;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" ( \
                id BIGSERIAL PRIMARY KEY, \
                created TIMESTAMPTZ NOT NULL DEFAULT now(), \
                modified TIMESTAMPTZ NOT NULL DEFAULT now(), \
                action VARCHAR(256) NOT NULL DEFAULT '', \
                actor VARCHAR(256) NOT NULL DEFAULT '', \
                object VARCHAR(256) NOT NULL DEFAULT '', \
                target VARCHAR(256) NOT NULL DEFAULT '', \
                description VARCHAR(256) NOT NULL DEFAULT '', \
                data JSONB \
            )"
        );
        sqlx::query(&ddl).execute(pool).await?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{table}_created\" ON \"{table}\" (created DESC)"
        );
        sqlx::query(&index).execute(pool).await?;
        Ok(())
    }

    /// Insert a new record, returning it with its store-assigned fields.
    pub async fn create(
        pool: &PgPool,
        model: &ModelDefinition,
        fields: &ActionFields,
    ) -> Result<TrackingRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO \"{}\" ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}",
            model.table
        );
        sqlx::query_as::<_, TrackingRecord>(&query)
            .bind(&fields.action)
            .bind(&fields.actor)
            .bind(&fields.object)
            .bind(&fields.target)
            .bind(&fields.description)
            .bind(&fields.data)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        model: &ModelDefinition,
        id: DbId,
    ) -> Result<Option<TrackingRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM \"{}\" WHERE id = $1", model.table);
        sqlx::query_as::<_, TrackingRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List records newest first, with optional search and pagination.
    pub async fn list(
        pool: &PgPool,
        model: &ModelDefinition,
        params: &TrackingQuery,
    ) -> Result<Vec<TrackingRecord>, sqlx::Error> {
        let table = &model.table;
        match params.search_term() {
            Some(term) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM \"{table}\" \
                     WHERE action ILIKE $1 OR object ILIKE $1 OR target ILIKE $1 \
                        OR description ILIKE $1 OR data::text ILIKE $1 \
                     ORDER BY id DESC LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, TrackingRecord>(&query)
                    .bind(like_pattern(term))
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM \"{table}\" ORDER BY id DESC LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, TrackingRecord>(&query)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
            }
        }
    }
}

/// Wrap `term` for a substring ILIKE, escaping its wildcards.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("widget"), "%widget%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
