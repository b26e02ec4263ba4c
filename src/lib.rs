//! Priority Cache - An in-memory key/value cache
//!
//! Evicts expired entries first, then the lowest priority, breaking priority
//! ties by least recent access. Ships with an HTTP server front end.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::PriorityCache;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
