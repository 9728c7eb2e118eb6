use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{Auth0Provider, SessionGate};
use crate::clubs::{ClubService, PgClubStore};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{ensure_schema, DatabaseManager};
use crate::handlers;
use crate::state::AppState;

pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Session lifecycle
        .merge(auth_routes())
        // Records (writes gated per handler)
        .merge(club_routes())
        // Global middleware
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/me", get(auth::me))
}

fn club_routes() -> Router<AppState> {
    use handlers::clubs;

    Router::new()
        .route("/clubs", get(clubs::list).post(clubs::create))
        .route("/clubs/:id", put(clubs::update).delete(clubs::delete))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    // A wildcard cannot be combined with credentialed requests
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| {
            if *origin == "*" {
                warn!("Ignoring wildcard CORS origin; session cookies need explicit origins");
                return false;
            }
            !origin.is_empty()
        })
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Wire the production collaborators, bring the schema up to date and serve
/// until interrupted.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let db = DatabaseManager::connect(&config.database)?;
    ensure_schema(db.pool())
        .await
        .context("schema initialization failed")?;

    let provider = Auth0Provider::new(&config.provider)?;
    let sessions = SessionGate::new(&config.session)?;
    let clubs = ClubService::new(Arc::new(PgClubStore::new(db.clone())));
    let state = AppState::new(clubs, sessions, Arc::new(provider), config.server.public_url.clone());

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Club registry listening on http://{}", bind_addr);

    axum::serve(listener, app(state, &config.security))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_with_cors(security: &SecurityConfig) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(security))
    }

    #[test]
    fn wildcard_origin_is_dropped() {
        let security = SecurityConfig {
            enable_cors: true,
            cors_origins: vec!["*".to_string(), " https://clubs.example.org ".to_string()],
        };
        let _ = router_with_cors(&security);
    }

    #[test]
    fn disabled_cors_builds() {
        let security = SecurityConfig {
            enable_cors: false,
            cors_origins: vec!["*".to_string()],
        };
        let _ = router_with_cors(&security);
    }
}
