//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{QUEUE_DISPLAY_COUNT, QueueCategory, StoreId};
use crate::board::{BoardStatus, BoardView};
use crate::cache::CacheEntryStats;
use crate::error::{ClassifiedError, ErrorKind};
use crate::stores::ResolutionSource;

/// Query string accepted by the board page and `/api/board`.
#[derive(Debug, Default, Deserialize)]
pub struct BoardRequest {
    /// Caller-supplied store id, passed through to the resolver as-is
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,
}

impl BoardRequest {
    /// The store id, if one was given. `?storeId=` counts as absent.
    pub fn requested(&self) -> Option<&str> {
        self.store_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }
}

/// Board state as JSON.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub store_id: StoreId,
    pub store_name: Option<String>,
    pub source: ResolutionSource,
    pub status: BoardStatus,
    pub walk_in_suspended: bool,
    pub heading: String,

    /// Always the three categories in display order
    pub queues: Vec<QueueSectionResult>,

    pub store_error: Option<ErrorResult>,
    pub queue_error: Option<ErrorResult>,

    /// When the displayed snapshot was fetched
    pub updated_at: Option<DateTime<Utc>>,

    /// Board clock text
    pub time: String,
}

/// One queue category.
#[derive(Debug, Serialize)]
pub struct QueueSectionResult {
    pub category: QueueCategory,
    pub title: &'static str,
    pub subtitle: &'static str,

    /// Full queue as reported by the backend
    pub tickets: Vec<String>,

    /// Top tickets padded with empty strings
    pub display: Vec<String>,
}

/// A classified error as shown to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Underlying error text
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Cache clear outcome. The local cache is always cleared.
#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub local_cleared: bool,
    pub backend_cleared: bool,
    pub error: Option<ErrorResult>,
}

/// Local cache statistics.
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub size: usize,
    pub entries: Vec<CacheEntryStats>,
    pub cache_duration_ms: u64,
    pub refresh_interval_ms: u64,
    pub debug: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl From<&ClassifiedError> for ErrorResult {
    fn from(err: &ClassifiedError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            detail: err.message().to_string(),
            timestamp: err.timestamp(),
        }
    }
}

impl BoardResponse {
    pub fn from_view(view: &BoardView, time: String) -> Self {
        let snapshot = view.queue.snapshot.clone().unwrap_or_default();

        let queues = QueueCategory::ALL
            .into_iter()
            .map(|category| QueueSectionResult {
                category,
                title: category.title(),
                subtitle: category.subtitle(),
                tickets: snapshot.queue(category).to_vec(),
                display: snapshot.top(category, QUEUE_DISPLAY_COUNT),
            })
            .collect();

        Self {
            store_id: view.store_id,
            store_name: view.store.as_ref().map(|s| s.name.clone()),
            source: view.source,
            status: view.status(),
            walk_in_suspended: view.walk_in_suspended(),
            heading: view.heading(),
            queues,
            store_error: view.store_error.as_ref().map(ErrorResult::from),
            queue_error: view.queue.error.as_ref().map(ErrorResult::from),
            updated_at: view.queue.updated_at,
            time,
        }
    }
}
