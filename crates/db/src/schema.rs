//! Table placement for tracking record types.
//!
//! Each trackable type gets its table only in the stores where the router
//! chain allows migration for its grouping label.

use actionlog_core::registry::{is_tracking_type, ModelDefinition, ModelRegistry};
use actionlog_core::router::RouterChain;

use crate::repositories::TrackingRecordRepo;
use crate::{StoreError, StorePools};

/// Pairs of `(store alias, record type)` whose table should exist.
pub fn plan_tables<'a, 'r>(
    stores: impl IntoIterator<Item = &'a str>,
    routing: &RouterChain,
    registry: &'r ModelRegistry,
) -> Vec<(&'a str, &'r ModelDefinition)> {
    let mut plan = Vec::new();
    for store in stores {
        for model in registry.models().filter(|m| is_tracking_type(m)) {
            if routing.allow_migrate(store, model.grouping_label()) {
                plan.push((store, model));
            }
        }
    }
    plan
}

/// Create every planned table that does not exist yet.
///
/// Returns the number of tables checked.
pub async fn sync_tracking_tables(
    pools: &StorePools,
    routing: &RouterChain,
    registry: &ModelRegistry,
) -> Result<usize, StoreError> {
    let plan = plan_tables(pools.aliases(), routing, registry);
    for (store, model) in &plan {
        let pool = pools.get(store)?;
        TrackingRecordRepo::ensure_table(pool, model).await?;
        tracing::info!(store, table = %model.table, "Tracking table ready");
    }
    Ok(plan.len())
}
