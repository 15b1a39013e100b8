//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::Value;
use tower_http::services::ServeDir;
use tracing::{error, warn};

use crate::error::{ClassifiedError, ErrorKind};
use crate::time::millis;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(board_page))
        .route("/health", get(health))
        .route("/api/board", get(board_json))
        .route("/api/board/refresh", post(refresh_board))
        .route("/api/board/resolve", post(resolve_board))
        .route("/api/backend/health", get(backend_health))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache", delete(clear_cache))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The board page.
async fn board_page(
    State(state): State<AppState>,
    Query(req): Query<BoardRequest>,
) -> impl IntoResponse {
    let view = state.board.show(req.requested()).await;
    let template = BoardTemplate::from_view(
        &view,
        state.clock.now(),
        state.config.refresh_interval.as_secs(),
    );
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Board state as JSON.
async fn board_json(
    State(state): State<AppState>,
    Query(req): Query<BoardRequest>,
) -> Json<BoardResponse> {
    let view = state.board.show(req.requested()).await;
    Json(BoardResponse::from_view(&view, state.clock.now()))
}

/// Poll the active store now.
async fn refresh_board(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if state.board.refresh_now().await {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(AppError::NotFound {
            message: "No store is being polled".to_string(),
        })
    }
}

/// Re-resolve the active store.
async fn resolve_board(State(state): State<AppState>) -> Json<BoardResponse> {
    let view = state.board.reresolve().await;
    Json(BoardResponse::from_view(&view, state.clock.now()))
}

/// Backend liveness, passed through.
async fn backend_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let body = state.api.check_health().await?;
    Ok(Json(body))
}

/// Local cache statistics.
async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.api.cache_stats();
    Json(CacheStatsResponse {
        size: stats.size,
        entries: stats.entries,
        cache_duration_ms: millis(state.config.cache_duration),
        refresh_interval_ms: millis(state.config.refresh_interval),
        debug: state.config.debug,
    })
}

/// Clear the local cache, then the backend's.
async fn clear_cache(State(state): State<AppState>) -> Response {
    match state.api.clear_cache().await {
        Ok(()) => Json(CacheClearResponse {
            local_cleared: true,
            backend_cleared: true,
            error: None,
        })
        .into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(CacheClearResponse {
                local_cleared: true,
                backend_cleared: false,
                error: Some(ErrorResult::from(&err)),
            }),
        )
            .into_response(),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// The backend failed or could not be reached.
    Upstream { message: String },
    Internal { message: String },
}

impl From<ClassifiedError> for AppError {
    fn from(e: ClassifiedError) -> Self {
        let message = e.user_message();
        match e.kind() {
            ErrorKind::Validation => AppError::BadRequest { message },
            ErrorKind::Unknown => AppError::Internal { message },
            ErrorKind::Network
            | ErrorKind::Timeout
            | ErrorKind::UpstreamClient
            | ErrorKind::UpstreamServer => AppError::Upstream { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        } else {
            warn!(status = status.as_u16(), %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
