//! Queue poller.
//!
//! One spawned task per displayed store. It fetches immediately, then once per
//! refresh interval, publishing into a watch channel. A failed poll records the
//! error and keeps the last good snapshot; the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{QueueSnapshot, StoreId};
use crate::cache::CachedApiClient;
use crate::error::ClassifiedError;
use crate::time::millis;

/// Default time between polls.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Shortest interval the poller will run at.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// What the board knows about one store's queues.
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    /// Last successful snapshot. Survives later failures.
    pub snapshot: Option<QueueSnapshot>,
    /// Error from the most recent poll, cleared by the next success.
    pub error: Option<ClassifiedError>,
    /// A fetch is in flight.
    pub loading: bool,
    /// When `snapshot` was fetched.
    pub updated_at: Option<DateTime<Utc>>,
    /// Completed polls, successful or not.
    pub polls: u64,
}

/// Starts pollers.
#[derive(Clone)]
pub struct QueuePoller {
    api: Arc<CachedApiClient>,
    interval: Duration,
    region: String,
}

impl QueuePoller {
    pub fn new(api: Arc<CachedApiClient>, interval: Duration, region: impl Into<String>) -> Self {
        Self {
            api,
            interval: interval.max(MIN_REFRESH_INTERVAL),
            region: region.into(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling a store.
    ///
    /// Returns `None` without spawning anything if the id is not a valid
    /// store id. `label` is only used for logging.
    pub fn start(&self, store_id: StoreId, label: impl Into<String>) -> Option<PollerHandle> {
        if store_id <= 0 {
            warn!(store_id, "invalid store id, queue polling disabled");
            return None;
        }

        let (state_tx, state_rx) = watch::channel(QueueState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            PollTarget {
                api: Arc::clone(&self.api),
                store_id,
                label: label.into(),
                region: self.region.clone(),
                interval: self.interval,
            },
            state_tx,
            shutdown_rx,
            Arc::clone(&refresh),
        ));

        Some(PollerHandle {
            state: state_rx,
            shutdown: shutdown_tx,
            refresh,
            task,
        })
    }
}

/// Handle to a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    state: watch::Receiver<QueueState>,
    shutdown: watch::Sender<bool>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Latest published state.
    pub fn state(&self) -> QueueState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<QueueState> {
        self.state.clone()
    }

    /// Poll now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Stop polling. A fetch in flight is abandoned and its result discarded.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollTarget {
    api: Arc<CachedApiClient>,
    store_id: StoreId,
    label: String,
    region: String,
    interval: Duration,
}

async fn run(
    target: PollTarget,
    state: watch::Sender<QueueState>,
    mut shutdown: watch::Receiver<bool>,
    refresh: Arc<Notify>,
) {
    let store_id = target.store_id;
    info!(
        store_id,
        store = %target.label,
        interval_ms = millis(target.interval),
        "queue polling started"
    );

    // First tick completes immediately.
    let mut ticker = tokio::time::interval(target.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {}
        }
        if *shutdown.borrow() {
            break;
        }

        state.send_modify(|s| s.loading = true);

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = target.api.fetch_queues(store_id, &target.region) => result,
        };

        if let Err(err) = &result {
            warn!(store_id, store = %target.label, kind = %err.kind(), "queue poll failed");
        }

        state.send_modify(|s| {
            s.loading = false;
            s.polls += 1;
            match result {
                Ok(snapshot) => {
                    s.snapshot = Some(snapshot);
                    s.error = None;
                    s.updated_at = Some(Utc::now());
                }
                Err(err) => s.error = Some(err),
            }
        });
    }

    debug!(store_id, "queue polling stopped");
}
