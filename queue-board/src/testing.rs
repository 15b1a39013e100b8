//! In-process fake of the queue backend for tests.
//!
//! Serves the same paths as the real backend on an ephemeral localhost port
//! and counts every hit, so tests can assert exactly how many network calls
//! the cache let through.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::api::{ApiClient, ApiClientConfig, StoreId};

#[derive(Default)]
struct FakeState {
    stores: Mutex<Value>,
    queues: Mutex<HashMap<StoreId, Value>>,
    failure: Mutex<Option<StatusCode>>,
    plain_text: Mutex<bool>,
    delay: Mutex<Duration>,
    store_hits: AtomicUsize,
    queue_hits: AtomicUsize,
    cache_clears: AtomicUsize,
}

impl FakeState {
    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure(&self) -> Option<Response> {
        if *self.plain_text.lock() {
            return Some((StatusCode::OK, "not json").into_response());
        }
        let status = (*self.failure.lock())?;
        let body = Json(json!({ "message": format!("forced {}", status.as_u16()) }));
        Some((status, body).into_response())
    }
}

/// Fake backend bound to `127.0.0.1:<ephemeral>`.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<FakeState>,
    base_url: String,
}

impl FakeBackend {
    /// Start a backend with stores 2 and 5 and queues for both.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        *state.stores.lock() = json!([
            { "id": 2, "name": "Mong Kok", "netTicketStatus": "OFFLINE_MANUAL" },
            { "id": 5, "name": "Causeway Bay", "netTicketStatus": "ONLINE" },
        ]);
        state.queues.lock().extend([
            (
                2,
                json!({ "storeQueue": ["201", "202"], "boothQueue": ["301"], "reservationQueue": [] }),
            ),
            (
                5,
                json!({ "storeQueue": [501, 502, 503, 504], "boothQueue": [], "reservationQueue": ["R1"] }),
            ),
        ]);

        let router = Router::new()
            .route("/api/stores", get(stores))
            .route("/api/queues/:id", get(queues))
            .route("/api/cache", axum::routing::delete(clear_cache))
            .route("/health", get(health))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Client pointed at this backend with the default timeout.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(ApiClientConfig::new(self.base_url())).expect("build client")
    }

    pub fn set_stores(&self, stores: Value) {
        *self.state.stores.lock() = stores;
    }

    pub fn set_queue(&self, store_id: StoreId, queue: Value) {
        self.state.queues.lock().insert(store_id, queue);
    }

    /// Answer every request with this status until cleared.
    pub fn set_failure(&self, status: Option<StatusCode>) {
        *self.state.failure.lock() = status;
    }

    /// Answer every request with `200 text/plain` until cleared.
    pub fn set_plain_text(&self, enabled: bool) {
        *self.state.plain_text.lock() = enabled;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = delay;
    }

    pub fn store_hits(&self) -> usize {
        self.state.store_hits.load(Ordering::SeqCst)
    }

    pub fn queue_hits(&self) -> usize {
        self.state.queue_hits.load(Ordering::SeqCst)
    }

    pub fn cache_clears(&self) -> usize {
        self.state.cache_clears.load(Ordering::SeqCst)
    }
}

async fn stores(State(state): State<Arc<FakeState>>) -> Response {
    state.store_hits.fetch_add(1, Ordering::SeqCst);
    state.pause().await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    Json(state.stores.lock().clone()).into_response()
}

async fn queues(State(state): State<Arc<FakeState>>, Path(id): Path<StoreId>) -> Response {
    state.queue_hits.fetch_add(1, Ordering::SeqCst);
    state.pause().await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    match state.queues.lock().get(&id) {
        Some(queue) => Json(queue.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("store {id} not found") })),
        )
            .into_response(),
    }
}

async fn clear_cache(State(state): State<Arc<FakeState>>) -> Response {
    state.cache_clears.fetch_add(1, Ordering::SeqCst);
    if let Some(failure) = state.failure() {
        return failure;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn health(State(state): State<Arc<FakeState>>) -> Response {
    state.pause().await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    Json(json!({ "status": "ok" })).into_response()
}

/// Base URL of a localhost port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}
