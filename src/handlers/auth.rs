use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{Identity, LoginClaims};
use crate::error::ApiError;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /login - Start the identity provider handshake
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, ApiError> {
    let request = state.provider.authorize();
    let jar = state.sessions.begin_login(jar, &request)?;

    info!("Dispatching login redirect to {}", request.url.origin().ascii_serialization());
    Ok((jar, Redirect::temporary(request.url.as_str())))
}

/// GET /callback - Finish the handshake and establish a session
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let (jar, login) = state.sessions.take_login(jar);

    let identity = match complete_login(&state, &query, login).await {
        Ok(identity) => identity,
        Err(err) => {
            error!("Login failed: {}", err);
            return (jar, err).into_response();
        }
    };

    match state.sessions.sign_in(jar, identity).await {
        Ok(jar) => (jar, Redirect::to("/")).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn complete_login(
    state: &AppState,
    query: &CallbackQuery,
    login: Option<LoginClaims>,
) -> Result<Identity, ApiError> {
    if let Some(error) = &query.error {
        let detail = query.error_description.as_deref().unwrap_or(error);
        return Err(ApiError::bad_request(format!("Identity provider refused login: {}", detail)));
    }

    let login = login.ok_or_else(|| ApiError::bad_request("Login session missing or expired"))?;

    if query.state.as_deref() != Some(login.state.as_str()) {
        warn!("Login state mismatch");
        return Err(ApiError::bad_request("Login state mismatch"));
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    Ok(state.provider.exchange(code, &login.verifier).await?)
}

/// GET /logout - Clear the local session and leave through the provider
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = state.sessions.sign_out(jar).await;
    let target = state.provider.logout_url(&state.public_url);
    (jar, Redirect::to(target.as_str()))
}

/// GET /me - Identity bound to the caller's session
pub async fn me(RequireIdentity(identity): RequireIdentity) -> Json<Identity> {
    Json(identity)
}
