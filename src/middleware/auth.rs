use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Rejects the request with 401 unless the session cookie resolves to a live
/// session. List it before any body extractor so authorization is decided
/// first.
#[derive(Clone, Debug)]
pub struct RequireIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match state.sessions.identity(&jar).await {
            Some(identity) => Ok(RequireIdentity(identity)),
            None => {
                tracing::warn!("{} {} rejected: not signed in", parts.method, parts.uri.path());
                Err(ApiError::unauthorized("Authentication required"))
            }
        }
    }
}

/// The caller's identity when signed in, without rejecting anonymous callers.
#[derive(Clone, Debug)]
pub struct MaybeIdentity(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeIdentity(state.sessions.identity(&jar).await))
    }
}
