//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the gateway is up.
//!
//! # Tasks
//! - Cache sweep: removes expired cache entries at the configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, CacheSweeper};
