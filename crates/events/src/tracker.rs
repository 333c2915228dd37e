//! Generic action tracking.
//!
//! [`TrackingHandler`] turns a details map into exactly one create call on the
//! configured [`ActionStore`]. Calls are attempted once, never retried, and not
//! deduplicated: two identical calls produce two records.

use std::sync::Arc;

use actionlog_core::details::ActionFields;
use actionlog_core::error::CoreError;
use actionlog_core::resolver::ConfigurationResolver;
use actionlog_core::settings::DEFAULT_ALIAS;
use actionlog_core::types::ActionDetails;
use actionlog_db::models::tracking::TrackingRecord;
use actionlog_db::{ActionStore, StoreError};

/// Errors raised while tracking an action.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Writes tracking records for a resolved model alias.
///
/// Cheaply cloneable; all state is behind `Arc`.
#[derive(Clone)]
pub struct TrackingHandler {
    resolver: Arc<ConfigurationResolver>,
    store: Arc<dyn ActionStore>,
}

impl TrackingHandler {
    pub fn new(resolver: Arc<ConfigurationResolver>, store: Arc<dyn ActionStore>) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &ConfigurationResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn ActionStore> {
        &self.store
    }

    pub fn is_enabled(&self) -> bool {
        self.resolver.settings().enabled
    }

    /// Track one action.
    ///
    /// Returns `Ok(None)` without touching the store when tracking is
    /// disabled. A missing or empty `alias` means the default alias.
    pub async fn track_action(
        &self,
        details: &ActionDetails,
        alias: Option<&str>,
    ) -> Result<Option<TrackingRecord>, TrackingError> {
        if !self.is_enabled() {
            tracing::debug!("Tracking disabled, action not recorded");
            return Ok(None);
        }

        let alias = alias.filter(|a| !a.is_empty()).unwrap_or(DEFAULT_ALIAS);
        let model = self.resolver.resolve_model(alias)?;
        let fields = ActionFields::from_details(details)?;
        let record = self.store.create(model, &fields).await?;

        tracing::info!(
            alias,
            table = %model.table,
            record_id = record.id,
            action = %record.action,
            "Action tracked",
        );
        Ok(Some(record))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use actionlog_core::registry::{ModelDefinition, ModelRegistry};
    use actionlog_core::router::{DatabaseRouter, RouterChain};
    use actionlog_core::settings::TrackingSettings;
    use actionlog_db::MemoryActionStore;

    use super::*;

    /// A handler over an in-memory store with `default` -> `audit.ActionLog`
    /// and `orders` -> `shop.OrderAction`.
    pub fn handler(enabled: bool) -> (TrackingHandler, Arc<MemoryActionStore>) {
        let mut registry = ModelRegistry::new();
        registry
            .register(ModelDefinition::trackable("audit", "ActionLog"))
            .unwrap();
        registry
            .register(ModelDefinition::trackable("shop", "OrderAction"))
            .unwrap();

        let settings = TrackingSettings {
            enabled,
            models: BTreeMap::from([
                ("default".to_string(), Some("audit.ActionLog".to_string())),
                ("orders".to_string(), Some("shop.OrderAction".to_string())),
                ("unset".to_string(), None),
            ]),
            ..TrackingSettings::default()
        };

        let routing = RouterChain::new().with_router(DatabaseRouter::new("tracking", &registry));
        let store = Arc::new(MemoryActionStore::new(Arc::new(routing)));
        let resolver = ConfigurationResolver::new(Arc::new(settings), Arc::new(registry));
        let handler = TrackingHandler::new(Arc::new(resolver), store.clone());
        (handler, store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
