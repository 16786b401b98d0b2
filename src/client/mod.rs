//! Client Module
//!
//! API-client layer for the exam REST API. Owns the cache-aside read path:
//! build a key, check the cache, fetch on a miss, store on success.

mod backend;
mod exam_client;
mod keys;

pub use backend::{Endpoint, ExamBackend, HttpBackend};
pub use exam_client::ExamClient;
pub use keys::CacheKey;

#[cfg(test)]
pub(crate) use exam_client::tests::FakeBackend;
