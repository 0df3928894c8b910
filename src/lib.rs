//! Leaderboard — read-cache over the winners and rates tables.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod error;
pub mod store;
pub mod cache;
pub mod engine;
pub mod api;
