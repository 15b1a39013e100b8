//! Store selection.
//!
//! Decides which store the board shows: the caller's choice if it exists,
//! then the configured default, then the first store the backend lists, and
//! finally the default id with no metadata when the list cannot be had.

mod resolver;

pub use resolver::{
    DEFAULT_STORE_ID, Resolution, ResolutionSource, StoreResolver, parse_requested_id,
    select_store,
};
