//! Caching exam API client
//!
//! Read-style calls check the shared cache first and only reach the upstream
//! on a miss. Only successful fetches are stored. Mutations bypass the cache
//! and drop the cached reads they make stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::SharedCache;
use crate::client::{CacheKey, Endpoint, ExamBackend};
use crate::error::{ApiError, Result};
use crate::models::{ExamResult, NewExamResult, NewUser, Question, User};

// == Exam Client ==
/// API client for the exam service with a response cache in front of it.
#[derive(Clone)]
pub struct ExamClient {
    backend: Arc<dyn ExamBackend>,
    cache: SharedCache<Value>,
    /// Bumped under the cache write lock by every mutation. A read whose
    /// fetch overlapped a mutation does not store its payload.
    invalidations: Arc<AtomicU64>,
}

impl ExamClient {
    /// Creates a client reading through `cache` to `backend`.
    pub fn new(backend: Arc<dyn ExamBackend>, cache: SharedCache<Value>) -> Self {
        Self {
            backend,
            cache,
            invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &SharedCache<Value> {
        &self.cache
    }

    // == Cached Reads ==

    /// Lists the available exams. Cached.
    pub async fn get_exams(&self) -> Result<Vec<String>> {
        self.cached_read(
            CacheKey::exams(),
            Endpoint::new(["questions", "exams"]),
            |_| true,
        )
        .await
    }

    /// Questions `user_id` has already answered in `exam`. Cached.
    pub async fn get_answered_questions(&self, user_id: &str, exam: &str) -> Result<Vec<Question>> {
        self.cached_read(
            CacheKey::answered_questions(user_id, exam),
            Endpoint::new(["results", "user", user_id, "questions"]).with_query("exam", exam),
            |_| true,
        )
        .await
    }

    /// Looks up a registered user by email. Cached when found.
    ///
    /// A miss upstream is not cached, so a registration that happens right
    /// after the lookup is visible on the next call.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.cached_read(
            CacheKey::user_by_email(email),
            Endpoint::new(["users", "email", email]),
            |user: &Option<User>| user.is_some(),
        )
        .await
    }

    /// Graded results of `user_id` for `exam`, newest first. Cached.
    pub async fn get_user_results(&self, user_id: &str, exam: &str) -> Result<Vec<ExamResult>> {
        self.cached_read(
            CacheKey::user_results(user_id, exam),
            Endpoint::new(["results", "user", user_id]).with_query("exam", exam),
            |_| true,
        )
        .await
    }

    // == Uncached Reads ==

    /// Every graded result of `user_id` across all exams. Never cached.
    pub async fn get_all_user_results(&self, user_id: &str) -> Result<Vec<ExamResult>> {
        let value = self
            .backend
            .get_json(&Endpoint::new(["results", "user", user_id]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Questions of `exam`, or of every exam when `None`. Never cached.
    pub async fn get_questions(&self, exam: Option<&str>) -> Result<Vec<Question>> {
        let mut endpoint = Endpoint::new(["questions"]);
        if let Some(exam) = exam {
            endpoint = endpoint.with_query("exam", exam);
        }
        let value = self.backend.get_json(&endpoint).await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Mutations ==

    /// Registers a user, then drops the cached lookup for their email.
    pub async fn save_user(&self, user: &NewUser) -> Result<User> {
        if let Some(msg) = user.validate() {
            return Err(ApiError::InvalidRequest(msg));
        }

        let body = serde_json::to_value(user)?;
        let value = self.backend.post_json(&Endpoint::new(["users"]), body).await?;
        let saved: User = serde_json::from_value(value)?;

        {
            let mut cache = self.cache.write().await;
            cache.invalidate(&CacheKey::user_by_email(&user.email));
            self.invalidations.fetch_add(1, Ordering::AcqRel);
        }
        Ok(saved)
    }

    /// Stores a graded attempt, then drops the user's cached results and
    /// answered questions for every exam.
    pub async fn save_result(&self, result: &NewExamResult) -> Result<ExamResult> {
        if let Some(msg) = result.validate() {
            return Err(ApiError::InvalidRequest(msg));
        }

        let body = serde_json::to_value(result)?;
        let value = self
            .backend
            .post_json(&Endpoint::new(["results"]), body)
            .await?;
        let saved: ExamResult = serde_json::from_value(value)?;

        let removed = {
            let mut cache = self.cache.write().await;
            let removed = cache.invalidate_prefix(&CacheKey::user_results_prefix(&result.user_id))
                + cache.invalidate_prefix(&CacheKey::answered_questions_prefix(&result.user_id));
            self.invalidations.fetch_add(1, Ordering::AcqRel);
            removed
        };
        debug!(user_id = %result.user_id, removed, "Invalidated cached reads after saving result");
        Ok(saved)
    }

    // == Read Path ==

    /// Returns the cached payload for `key`, or fetches `endpoint`, decodes it
    /// and caches it if `cacheable` accepts the decoded value.
    ///
    /// The cache lock is never held across the upstream call. Failed fetches
    /// and undecodable payloads are not cached, and neither is a payload whose
    /// fetch overlapped a mutation, since it may predate that mutation.
    async fn cached_read<R, F>(&self, key: String, endpoint: Endpoint, cacheable: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: FnOnce(&R) -> bool,
    {
        let cached = self.cache.write().await.get(&key);
        if let Some(value) = cached {
            match serde_json::from_value::<R>(value) {
                Ok(hit) => return Ok(hit),
                Err(e) => {
                    warn!(key = %key, error = %e, "Dropping cached payload that no longer decodes");
                    self.cache.write().await.invalidate(&key);
                }
            }
        }

        let epoch = self.invalidations.load(Ordering::Acquire);
        let value = self.backend.get_json(&endpoint).await?;
        let decoded: R = serde_json::from_value(value.clone())?;

        if cacheable(&decoded) {
            let mut cache = self.cache.write().await;
            if self.invalidations.load(Ordering::Acquire) == epoch {
                cache.set(key, value);
            } else {
                debug!(key = %key, "Not caching read that overlapped a mutation");
            }
        }
        Ok(decoded)
    }
}
