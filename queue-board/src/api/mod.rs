//! Queue backend HTTP API.
//!
//! The backend is an external service exposing store metadata and live queue
//! numbers. This module only knows how to talk to it: paths, wire types and
//! transport errors. Caching and classification live one layer up, in
//! [`crate::cache`].

mod client;
mod error;
mod types;

pub use client::{ApiClient, ApiClientConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::ApiError;
pub use types::{
    CACHE_PATH, HEALTH_PATH, MAX_NUM_RESULTS, MIN_NUM_RESULTS, NetTicketStatus, QUEUE_DISPLAY_COUNT,
    QUEUES_PATH, QueueCategory, QueueSnapshot, STORES_PATH, Store, StoreId, StoreQuery,
    queues_endpoint,
};
