use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::middleware::MaybeIdentity;
use crate::state::AppState;

/// GET / - Service index with the signed-in user, if any
pub async fn root(MaybeIdentity(identity): MaybeIdentity) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Club Registry",
        "version": version,
        "user": identity,
        "endpoints": {
            "clubs": "GET /clubs (public), POST /clubs, PUT|DELETE /clubs/:id (signed in)",
            "session": "/login, /callback, /logout, /me",
            "health": "/health",
        }
    }))
}

/// GET /health - Database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.clubs.health().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                })),
            )
        }
    }
}
