//! API Handlers
//!
//! HTTP request handlers for the caching gateway. Exam endpoints delegate to
//! `ExamClient`; the rest inspect or invalidate the cache directly.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{shared, SharedCache, TtlCache};
use crate::client::{ExamClient, HttpBackend};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    ExamQuery, ExamResult, HealthResponse, InvalidateResponse, NewExamResult, NewUser, Question,
    StatsResponse, User,
};

/// Application state shared across all handlers.
///
/// The cache handle is the same one the client reads through, so stats and
/// invalidation act on the live cache.
#[derive(Clone)]
pub struct AppState {
    /// Caching exam API client
    pub client: ExamClient,
    /// Shared response cache
    pub cache: SharedCache<Value>,
}

impl AppState {
    /// Creates a new AppState around `client` and its cache.
    pub fn new(client: ExamClient) -> Self {
        let cache = client.cache().clone();
        Self { client, cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the HTTP backend and an empty cache. The sweep task is not
    /// started here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.upstream_url, config.upstream_timeout())?;
        info!(upstream = %backend.base_url(), "Upstream client ready");
        let cache = shared(TtlCache::new(config.cache_config()));
        Ok(Self::new(ExamClient::new(Arc::new(backend), cache)))
    }
}

fn required_exam(query: &ExamQuery) -> Result<&str> {
    query.require().map_err(ApiError::InvalidRequest)
}

/// Handler for GET /api/questions/exams
pub async fn get_exams_handler(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.client.get_exams().await?))
}

/// Handler for GET /api/questions?exam=
pub async fn get_questions_handler(
    State(state): State<AppState>,
    Query(query): Query<ExamQuery>,
) -> Result<Json<Vec<Question>>> {
    let exam = query.exam.as_deref().filter(|e| !e.trim().is_empty());
    Ok(Json(state.client.get_questions(exam).await?))
}

/// Handler for GET /api/users/email/:email
///
/// Answers `null` when no user is registered with that email.
pub async fn get_user_by_email_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Option<User>>> {
    Ok(Json(state.client.get_user_by_email(&email).await?))
}

/// Handler for POST /api/users
pub async fn save_user_handler(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> Result<Json<User>> {
    Ok(Json(state.client.save_user(&user).await?))
}

/// Handler for POST /api/results
pub async fn save_result_handler(
    State(state): State<AppState>,
    Json(result): Json<NewExamResult>,
) -> Result<Json<ExamResult>> {
    Ok(Json(state.client.save_result(&result).await?))
}

/// Handler for GET /api/results/user/:user_id?exam=
///
/// Without `exam`, every result of the user is forwarded uncached.
pub async fn get_user_results_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ExamQuery>,
) -> Result<Json<Vec<ExamResult>>> {
    let results = match query.exam.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(exam) => state.client.get_user_results(&user_id, exam).await?,
        None => state.client.get_all_user_results(&user_id).await?,
    };
    Ok(Json(results))
}

/// Handler for GET /api/results/user/:user_id/questions?exam=
pub async fn get_answered_questions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ExamQuery>,
) -> Result<Json<Vec<Question>>> {
    let exam = required_exam(&query)?;
    Ok(Json(
        state.client.get_answered_questions(&user_id, exam).await?,
    ))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if state.cache.write().await.invalidate(&key) {
        info!(key = %key, "Cache entry invalidated");
        Ok(Json(InvalidateResponse::key(&key)))
    } else {
        Err(ApiError::NotFound(key))
    }
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = {
        let mut cache = state.cache.write().await;
        let removed = cache.len();
        cache.clear();
        removed
    };
    info!(removed, "Cache cleared");
    Json(InvalidateResponse::cleared(removed))
}
