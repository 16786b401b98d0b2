//! Exam Cache - caching API client and gateway for the exam service
//!
//! Memoizes idempotent reads of the exam REST API in a TTL cache with a
//! background expiry sweep and a bound on the number of entries.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{SharedCache, TtlCache};
pub use client::ExamClient;
pub use config::{CacheConfig, Config};
pub use tasks::CacheSweeper;
