use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health
/// Returns a simple status object with service version and extraction mode.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let skill_extraction = match &state.text_provider {
        Some(_) => format!("provider ({})", state.config.llm.model),
        None => "heuristic".to_string(),
    };

    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "hirewise-api",
        "skillExtraction": skill_extraction,
    }))
}
