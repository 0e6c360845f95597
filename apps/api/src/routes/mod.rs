pub mod health;

use axum::{
    http::{Method, Uri},
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::jobs::handlers;
use crate::state::AppState;

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {method} {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Jobs API
        .route("/api/jobs", get(handlers::handle_list_jobs))
        .route("/api/jobs/create", post(handlers::handle_create_job))
        .route("/api/jobs/generate-jd", post(handlers::handle_generate_jd))
        // Dynamic id routes; the static segments above take priority
        .route("/api/jobs/:id", get(handlers::handle_get_job))
        .route(
            "/api/jobs/:id/generate-skills",
            post(handlers::handle_generate_skills),
        )
        .route("/api/jobs/:id/activate", post(handlers::handle_activate_job))
        .route("/api/jobs/:id/close", post(handlers::handle_close_job))
        .fallback(not_found)
        .with_state(state)
}
