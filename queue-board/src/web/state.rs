//! Application state for the web layer.

use std::sync::Arc;

use crate::board::Board;
use crate::cache::CachedApiClient;
use crate::config::BoardConfig;
use crate::time::Clock;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The active board and its poller
    pub board: Arc<Board>,

    /// Cached backend client, shared with the board
    pub api: Arc<CachedApiClient>,

    /// Board clock
    pub clock: Arc<Clock>,

    pub config: Arc<BoardConfig>,
}

impl AppState {
    pub fn new(
        board: Arc<Board>,
        api: Arc<CachedApiClient>,
        clock: Clock,
        config: BoardConfig,
    ) -> Self {
        Self {
            board,
            api,
            clock: Arc::new(clock),
            config: Arc::new(config),
        }
    }
}
