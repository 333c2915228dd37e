//! Storage backends for tracking records.
//!
//! [`ActionStore`] is the create/read contract the tracking handlers depend
//! on. [`PgActionStore`] routes each call to a PostgreSQL pool through the
//! router chain; [`MemoryActionStore`] keeps records in process and applies the
//! same routing, which makes it suitable for tests and local tooling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use actionlog_core::details::ActionFields;
use actionlog_core::registry::ModelDefinition;
use actionlog_core::router::RouterChain;
use actionlog_core::types::DbId;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::tracking::{TrackingQuery, TrackingRecord};
use crate::repositories::TrackingRecordRepo;
use crate::{StoreError, StorePools};

/// Create and read access to tracking records.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Persist one record of type `model`. Each call creates a new record.
    async fn create(
        &self,
        model: &ModelDefinition,
        fields: &ActionFields,
    ) -> Result<TrackingRecord, StoreError>;

    /// Retrieve a record by its ID.
    async fn find(
        &self,
        model: &ModelDefinition,
        id: DbId,
    ) -> Result<Option<TrackingRecord>, StoreError>;

    /// List records newest first.
    async fn list(
        &self,
        model: &ModelDefinition,
        query: &TrackingQuery,
    ) -> Result<Vec<TrackingRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// PgActionStore
// ---------------------------------------------------------------------------

/// PostgreSQL-backed store with per-type routing.
pub struct PgActionStore {
    pools: StorePools,
    routing: Arc<RouterChain>,
}

impl PgActionStore {
    pub fn new(pools: StorePools, routing: Arc<RouterChain>) -> Self {
        Self { pools, routing }
    }

    pub fn pools(&self) -> &StorePools {
        &self.pools
    }
}

#[async_trait]
impl ActionStore for PgActionStore {
    async fn create(
        &self,
        model: &ModelDefinition,
        fields: &ActionFields,
    ) -> Result<TrackingRecord, StoreError> {
        let store = self.routing.route_write(model);
        let pool = self.pools.get(store)?;
        let record = TrackingRecordRepo::create(pool, model, fields).await?;
        tracing::debug!(store, table = %model.table, record_id = record.id, "Tracking record inserted");
        Ok(record)
    }

    async fn find(
        &self,
        model: &ModelDefinition,
        id: DbId,
    ) -> Result<Option<TrackingRecord>, StoreError> {
        let pool = self.pools.get(self.routing.route_read(model))?;
        Ok(TrackingRecordRepo::find_by_id(pool, model, id).await?)
    }

    async fn list(
        &self,
        model: &ModelDefinition,
        query: &TrackingQuery,
    ) -> Result<Vec<TrackingRecord>, StoreError> {
        let pool = self.pools.get(self.routing.route_read(model))?;
        Ok(TrackingRecordRepo::list(pool, model, query).await?)
    }
}

// ---------------------------------------------------------------------------
// MemoryActionStore
// ---------------------------------------------------------------------------

/// Rows keyed by `(store alias, table)`.
type Tables = BTreeMap<(String, String), Vec<TrackingRecord>>;

/// In-process store that honours routing decisions.
pub struct MemoryActionStore {
    routing: Arc<RouterChain>,
    next_id: AtomicI64,
    tables: Mutex<Tables>,
}

impl MemoryActionStore {
    pub fn new(routing: Arc<RouterChain>) -> Self {
        Self {
            routing,
            next_id: AtomicI64::new(1),
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    /// All records held for `table` in `store`, oldest first.
    pub async fn records(&self, store: &str, table: &str) -> Vec<TrackingRecord> {
        self.tables
            .lock()
            .await
            .get(&(store.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of records across every store and table.
    pub async fn len(&self) -> usize {
        self.tables.lock().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ActionStore for MemoryActionStore {
    async fn create(
        &self,
        model: &ModelDefinition,
        fields: &ActionFields,
    ) -> Result<TrackingRecord, StoreError> {
        fields.check_lengths()?;

        let store = self.routing.route_write(model).to_string();
        let now = chrono::Utc::now();
        let record = TrackingRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            created: now,
            modified: now,
            action: fields.action.clone(),
            actor: fields.actor.clone(),
            object: fields.object.clone(),
            target: fields.target.clone(),
            description: fields.description.clone(),
            data: fields.data.clone(),
        };

        self.tables
            .lock()
            .await
            .entry((store, model.table.clone()))
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        model: &ModelDefinition,
        id: DbId,
    ) -> Result<Option<TrackingRecord>, StoreError> {
        let store = self.routing.route_read(model);
        Ok(self
            .records(store, &model.table)
            .await
            .into_iter()
            .find(|r| r.id == id))
    }

    async fn list(
        &self,
        model: &ModelDefinition,
        query: &TrackingQuery,
    ) -> Result<Vec<TrackingRecord>, StoreError> {
        let store = self.routing.route_read(model);
        let offset = usize::try_from(query.offset()).unwrap_or(0);
        let limit = usize::try_from(query.limit()).unwrap_or(0);
        Ok(self
            .records(store, &model.table)
            .await
            .into_iter()
            .rev()
            .filter(|r| query.matches(r))
            .skip(offset)
            .take(limit)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
