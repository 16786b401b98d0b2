//! API Module
//!
//! HTTP handlers and routing for the caching gateway. Exam endpoints keep the
//! upstream's paths so the gateway can stand in for the exam API.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
