pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

/// Uploads (résumé PDFs, recorded answers) can run large; 25 MiB covers both.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/interview/start",
            post(handlers::handle_start_interview),
        )
        .route(
            "/api/interview/:session_id/transcribe",
            post(handlers::handle_transcribe_answer),
        )
        .route(
            "/api/interview/:session_id/next",
            post(handlers::handle_next_question),
        )
        .route(
            "/api/interview/:session_id/end",
            post(handlers::handle_end_interview),
        )
        .route(
            "/api/interview/:session_id/report",
            get(handlers::handle_get_report),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
