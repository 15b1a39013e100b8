//! Store resolution with a fixed fallback chain.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{Store, StoreId, StoreQuery};
use crate::cache::CachedApiClient;
use crate::error::ClassifiedError;

/// Store shown when nothing else is configured.
pub const DEFAULT_STORE_ID: StoreId = 2;

/// Which step of the chain produced the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The caller's store id matched a listed store.
    Requested,
    /// The configured default matched a listed store.
    Default,
    /// Neither matched; first listed store.
    FirstAvailable,
    /// The store list was unavailable; default id without metadata.
    Fallback,
}

/// Outcome of a resolution. Always carries a store id.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub store_id: StoreId,
    /// Absent only for [`ResolutionSource::Fallback`].
    pub store: Option<Store>,
    pub source: ResolutionSource,
    /// Why the chain fell back, if it did.
    pub error: Option<ClassifiedError>,
}

/// Parse a caller-supplied store id.
///
/// Surrounding whitespace is ignored; anything else that is not a plain
/// integer is rejected.
pub fn parse_requested_id(raw: &str) -> Option<StoreId> {
    raw.trim().parse().ok()
}

/// Pick a store from a non-empty list.
///
/// Returns `None` only when `stores` is empty.
pub fn select_store(
    stores: &[Store],
    requested: Option<StoreId>,
    default_id: StoreId,
) -> Option<(&Store, ResolutionSource)> {
    if let Some(id) = requested {
        if let Some(store) = stores.iter().find(|s| s.id == id) {
            return Some((store, ResolutionSource::Requested));
        }
        warn!(store_id = id, "requested store not found");
    }

    if let Some(store) = stores.iter().find(|s| s.id == default_id) {
        return Some((store, ResolutionSource::Default));
    }

    stores
        .first()
        .map(|store| (store, ResolutionSource::FirstAvailable))
}

/// Resolves which store the board displays.
pub struct StoreResolver {
    api: Arc<CachedApiClient>,
    query: StoreQuery,
    default_store_id: StoreId,
}

impl StoreResolver {
    pub fn new(api: Arc<CachedApiClient>, query: StoreQuery, default_store_id: StoreId) -> Self {
        Self {
            api,
            query,
            default_store_id,
        }
    }

    /// Resolve the store for an optional caller-supplied id.
    ///
    /// Never fails: any error while fetching or checking the store list
    /// resolves to the default id with no metadata and the error attached.
    pub async fn resolve(&self, requested: Option<&str>) -> Resolution {
        match self.try_resolve(requested).await {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(
                    kind = %err.kind(),
                    error = %err,
                    fallback_store_id = self.default_store_id,
                    "store resolution failed, using fallback store id"
                );
                Resolution {
                    store_id: self.default_store_id,
                    store: None,
                    source: ResolutionSource::Fallback,
                    error: Some(err),
                }
            }
        }
    }

    async fn try_resolve(&self, requested: Option<&str>) -> Result<Resolution, ClassifiedError> {
        let stores = self.api.fetch_stores(&self.query).await?;
        if stores.is_empty() {
            return Err(ClassifiedError::validation("No stores available"));
        }

        let requested_id = requested
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| {
                let parsed = parse_requested_id(raw);
                if parsed.is_none() {
                    warn!(store_id = raw, "invalid store id in request, ignoring");
                }
                parsed
            });

        let (store, source) = select_store(&stores, requested_id, self.default_store_id)
            .ok_or_else(|| ClassifiedError::validation("No stores available"))?;

        info!(
            store_id = store.id,
            store = %store.name,
            source = ?source,
            "resolved store"
        );

        Ok(Resolution {
            store_id: store.id,
            store: Some(store.clone()),
            source,
            error: None,
        })
    }
}
