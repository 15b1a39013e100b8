//! Web layer for the queue board.
//!
//! Serves the board page, its JSON twin, and a few maintenance endpoints.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
