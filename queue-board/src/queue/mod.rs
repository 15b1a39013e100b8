//! Periodic queue polling for the resolved store.

mod poller;

pub use poller::{DEFAULT_REFRESH_INTERVAL, PollerHandle, QueuePoller, QueueState};
