//! Persistence backend for tracking records.
//!
//! Record types are routed to physical stores by a
//! [`RouterChain`](actionlog_core::router::RouterChain); each store alias maps
//! to its own connection pool in [`StorePools`].

use std::collections::BTreeMap;

use actionlog_core::error::CoreError;
use actionlog_core::router::DEFAULT_STORE;
use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

pub use store::{ActionStore, MemoryActionStore, PgActionStore};

pub type DbPool = sqlx::PgPool;

/// Errors raised by the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No connection pool configured for store '{0}'")]
    UnknownStore(String),
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// StorePools
// ---------------------------------------------------------------------------

/// Connection pools keyed by store alias.
///
/// The [`DEFAULT_STORE`] alias is always present. Several aliases may share
/// one pool when they live in the same physical database.
#[derive(Debug, Clone)]
pub struct StorePools {
    pools: BTreeMap<String, DbPool>,
}

impl StorePools {
    pub fn new(default_pool: DbPool) -> Self {
        Self {
            pools: BTreeMap::from([(DEFAULT_STORE.to_string(), default_pool)]),
        }
    }

    /// Pools for the default store plus the tracking store.
    ///
    /// Without a dedicated pool the tracking store shares the default one. A
    /// dedicated pool cannot be bound to [`DEFAULT_STORE`], since it would
    /// replace the default pool.
    pub fn for_tracking(
        default_pool: DbPool,
        tracking_alias: &str,
        tracking_pool: Option<DbPool>,
    ) -> Result<Self, StoreError> {
        let pools = Self::new(default_pool);
        match tracking_pool {
            Some(_) if tracking_alias == DEFAULT_STORE => {
                Err(StoreError::Core(CoreError::Configuration(format!(
                    "A separate tracking database cannot use the '{DEFAULT_STORE}' store alias"
                ))))
            }
            Some(pool) => Ok(pools.with_store(tracking_alias, pool)),
            None if tracking_alias == DEFAULT_STORE => Ok(pools),
            None => {
                let shared = pools.get(DEFAULT_STORE)?.clone();
                Ok(pools.with_store(tracking_alias, shared))
            }
        }
    }

    /// Add or replace the pool behind `alias`.
    pub fn with_store(mut self, alias: impl Into<String>, pool: DbPool) -> Self {
        self.pools.insert(alias.into(), pool);
        self
    }

    pub fn get(&self, alias: &str) -> Result<&DbPool, StoreError> {
        self.pools
            .get(alias)
            .ok_or_else(|| StoreError::UnknownStore(alias.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DbPool)> {
        self.pools.iter().map(|(alias, pool)| (alias.as_str(), pool))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn lazy_pool() -> DbPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/actionlog_unused")
            .unwrap()
    }

    #[tokio::test]
    async fn tracking_store_shares_default_pool_without_its_own() {
        let pools = StorePools::for_tracking(lazy_pool(), "tracking", None).unwrap();
        assert_eq!(pools.aliases().collect::<Vec<_>>(), vec!["default", "tracking"]);
    }

    #[tokio::test]
    async fn dedicated_pool_is_added_under_its_alias() {
        let pools = StorePools::for_tracking(lazy_pool(), "tracking", Some(lazy_pool())).unwrap();
        assert!(pools.get("tracking").is_ok());
        assert_matches!(pools.get("missing"), Err(StoreError::UnknownStore(_)));
    }

    #[tokio::test]
    async fn dedicated_pool_cannot_replace_the_default_store() {
        let err = StorePools::for_tracking(lazy_pool(), DEFAULT_STORE, Some(lazy_pool())).unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn default_alias_without_dedicated_pool_is_a_single_store() {
        let pools = StorePools::for_tracking(lazy_pool(), DEFAULT_STORE, None).unwrap();
        assert_eq!(pools.aliases().collect::<Vec<_>>(), vec!["default"]);
    }
}
