//! Restaurant queue board server.
//!
//! Shows the next ticket numbers waiting to be seated at one store, polling
//! a queue backend and rendering a full-screen board for in-store displays.

pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod error;
pub mod queue;
pub mod stores;
pub mod time;
pub mod web;

#[cfg(test)]
mod testing;
