//! The active display board.
//!
//! Owns the current store resolution and the poller feeding it. Asking for a
//! different store id re-runs resolution and replaces the poller; the old one
//! is stopped before the new one starts. A board that fell back because the
//! store list was unavailable is resolved again on the next request once a
//! refresh interval has passed.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::{Store, StoreId};
use crate::error::ClassifiedError;
use crate::queue::{PollerHandle, QueuePoller, QueueState};
use crate::stores::{Resolution, ResolutionSource, StoreResolver};

/// Heading suffix shown after the store name.
const HEADING_SUFFIX: &str = "即將要帶位的號碼:";

/// Point-in-time view of the board.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub store_id: StoreId,
    pub store: Option<Store>,
    pub source: ResolutionSource,
    /// Why store resolution fell back, if it did.
    pub store_error: Option<ClassifiedError>,
    pub queue: QueueState,
    /// Whether a poller is running for this store.
    pub polling: bool,
}

impl BoardView {
    /// Page heading, with the store name when metadata is available.
    pub fn heading(&self) -> String {
        match &self.store {
            Some(store) => format!("{}{HEADING_SUFFIX}", store.name),
            None => HEADING_SUFFIX.to_string(),
        }
    }

    /// Walk-in suspended banner applies only when store metadata is known.
    pub fn walk_in_suspended(&self) -> bool {
        self.store.as_ref().is_some_and(Store::walk_in_suspended)
    }

    /// User-facing messages for the resolver and poller errors, in that order.
    pub fn messages(&self) -> Vec<String> {
        self.store_error
            .iter()
            .chain(self.queue.error.iter())
            .map(ClassifiedError::user_message)
            .collect()
    }

    /// No snapshot yet and nothing has failed.
    pub fn queue_loading(&self) -> bool {
        self.queue.snapshot.is_none() && self.queue.error.is_none()
    }
}

/// Status label for logs and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardStatus {
    Loading,
    Ready,
    Degraded,
}

impl BoardView {
    pub fn status(&self) -> BoardStatus {
        if self.store_error.is_some() || self.queue.error.is_some() {
            BoardStatus::Degraded
        } else if self.queue_loading() {
            BoardStatus::Loading
        } else {
            BoardStatus::Ready
        }
    }
}

struct ActiveBoard {
    /// Caller-supplied id this board was resolved for.
    requested: Option<String>,
    resolution: Resolution,
    resolved_at: Instant,
    poller: Option<PollerHandle>,
}

impl ActiveBoard {
    fn view(&self) -> BoardView {
        BoardView {
            store_id: self.resolution.store_id,
            store: self.resolution.store.clone(),
            source: self.resolution.source,
            store_error: self.resolution.error.clone(),
            queue: self
                .poller
                .as_ref()
                .map(PollerHandle::state)
                .unwrap_or_default(),
            polling: self.poller.is_some(),
        }
    }

    /// Whether a request for `requested` can be served by this board.
    ///
    /// A fallback board stops serving once `retry_after` has passed since it
    /// was resolved.
    fn serves(&self, requested: Option<&str>, now: Instant, retry_after: Duration) -> bool {
        let same_store = match requested {
            None => true,
            Some(raw) => self.requested.as_deref() == Some(raw),
        };
        let stale_fallback = self.resolution.source == ResolutionSource::Fallback
            && now.saturating_duration_since(self.resolved_at) >= retry_after;
        same_store && !stale_fallback
    }
}

/// The board controller.
pub struct Board {
    resolver: StoreResolver,
    poller: QueuePoller,
    active: Mutex<Option<ActiveBoard>>,
}

impl Board {
    pub fn new(resolver: StoreResolver, poller: QueuePoller) -> Self {
        Self {
            resolver,
            poller,
            active: Mutex::new(None),
        }
    }

    /// Show the board for an optional caller-supplied store id.
    ///
    /// Without an id the active board is kept. With an id that differs from
    /// the one the active board was resolved for, the board is re-resolved.
    /// A fallback board is re-resolved at most once per refresh interval.
    pub async fn show(&self, requested: Option<&str>) -> BoardView {
        let mut active = self.active.lock().await;
        let retry_after = self.poller.interval();

        let current = match active.take() {
            Some(current) if current.serves(requested, Instant::now(), retry_after) => current,
            previous => {
                self.retire(previous);
                self.start(requested).await
            }
        };

        let view = current.view();
        *active = Some(current);
        view
    }

    /// Re-run store resolution for the same caller-supplied id.
    pub async fn reresolve(&self) -> BoardView {
        let mut active = self.active.lock().await;

        let previous = active.take();
        let requested = previous.as_ref().and_then(|p| p.requested.clone());
        self.retire(previous);

        let current = self.start(requested.as_deref()).await;
        let view = current.view();
        *active = Some(current);
        view
    }

    /// Poll the active store now. Returns false if nothing is polling.
    pub async fn refresh_now(&self) -> bool {
        let active = self.active.lock().await;
        match active.as_ref().and_then(|a| a.poller.as_ref()) {
            Some(poller) => {
                poller.refresh_now();
                true
            }
            None => false,
        }
    }

    /// Current view without resolving anything, if a board is active.
    pub async fn current(&self) -> Option<BoardView> {
        self.active.lock().await.as_ref().map(ActiveBoard::view)
    }

    /// Stop the active poller.
    pub async fn shutdown(&self) {
        let previous = self.active.lock().await.take();
        self.retire(previous);
    }

    fn retire(&self, previous: Option<ActiveBoard>) {
        if let Some(previous) = previous {
            if let Some(poller) = &previous.poller {
                poller.stop();
            }
            info!(store_id = previous.resolution.store_id, "board retired");
        }
    }

    async fn start(&self, requested: Option<&str>) -> ActiveBoard {
        let resolution = self.resolver.resolve(requested).await;
        let label = resolution
            .store
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| resolution.store_id.to_string());
        let poller = self.poller.start(resolution.store_id, label);

        ActiveBoard {
            requested: requested.map(str::to_string),
            resolution,
            resolved_at: Instant::now(),
            poller,
        }
    }
}
