//! API Routes
//!
//! Configures the Axum router with the gateway endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_answered_questions_handler, get_exams_handler, get_questions_handler,
    get_user_by_email_handler, get_user_results_handler, health_handler, invalidate_key_handler,
    save_result_handler, save_user_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/questions/exams` - List exams (cached)
/// - `GET /api/questions?exam=` - List questions (not cached)
/// - `GET /api/users/email/:email` - Look up a user (cached when found)
/// - `POST /api/users` - Register a user
/// - `POST /api/results` - Save a graded attempt
/// - `GET /api/results/user/:user_id?exam=` - A user's results (cached; all exams uncached without `exam`)
/// - `GET /api/results/user/:user_id/questions?exam=` - Answered questions (cached)
/// - `GET /stats` - Cache statistics
/// - `GET /health`, `GET /api/health` - Health check
/// - `DELETE /cache/:key` - Invalidate one cached response
/// - `DELETE /cache` - Clear the cache
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/questions/exams", get(get_exams_handler))
        .route("/api/questions", get(get_questions_handler))
        .route("/api/users/email/:email", get(get_user_by_email_handler))
        .route("/api/users", post(save_user_handler))
        .route("/api/results", post(save_result_handler))
        .route("/api/results/user/:user_id", get(get_user_results_handler))
        .route(
            "/api/results/user/:user_id/questions",
            get(get_answered_questions_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:key", delete(invalidate_key_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
