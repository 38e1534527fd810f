//! cachecast - a network-accessible in-memory cache with change notifications
//!
//! Provides a bounded key-value store with TTL expiration, frequency-based
//! (LFU) eviction, and a publish/subscribe channel that pushes cache events
//! to connected clients over the same line-delimited JSON protocol they use
//! for requests.

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod server;
pub mod tasks;

pub use config::Config;
pub use server::AppState;
pub use tasks::spawn_cleanup_task;
