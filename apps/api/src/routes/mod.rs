pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::resume::handlers::handle_analyze_resume;
use crate::state::AppState;

/// Upper bound for an uploaded résumé.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/analyze-resume",
            post(handle_analyze_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/start-interview",
            post(handlers::handle_start_interview),
        )
        .route("/api/submit-answer", post(handlers::handle_submit_answer))
        .route(
            "/api/interview-results/:session_id",
            get(handlers::handle_interview_results),
        )
        .route(
            "/api/interview-results/:session_id/suggestions",
            get(handlers::handle_suggestions),
        )
        .with_state(state)
}
