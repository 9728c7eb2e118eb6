use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use tracing::{debug, info};

use super::{
    AuthorizationRequest, Identity, LoginClaims, SessionClaims, SessionStore, TokenError,
    TokenKeys,
};
use crate::config::{SessionConfig, MAX_SESSION_TTL_HOURS};

pub const SESSION_COOKIE: &str = "club_session";
pub const LOGIN_COOKIE: &str = "club_login";

/// How long a started login may take before `/callback` refuses it.
const LOGIN_TTL_MINUTES: i64 = 15;

/// Decides whether a request carries an authenticated identity, and owns the
/// cookie side of signing in and out.
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<SessionStore>,
    keys: TokenKeys,
    secure: bool,
}

impl SessionGate {
    pub fn new(config: &SessionConfig) -> Result<Self, TokenError> {
        let ttl = Duration::hours(config.ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64);
        Ok(Self {
            store: Arc::new(SessionStore::new(ttl)),
            keys: TokenKeys::from_secret(&config.secret)?,
            secure: config.cookie_secure,
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn identity(&self, jar: &CookieJar) -> Option<Identity> {
        let sid = self.session_id(jar)?;
        self.store.get(&sid).await
    }

    pub async fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.identity(jar).await.is_some()
    }

    /// Bind `identity` to a new session, replacing any the caller already had.
    pub async fn sign_in(&self, jar: CookieJar, identity: Identity) -> Result<CookieJar, TokenError> {
        if let Some(previous) = self.session_id(&jar) {
            self.store.remove(&previous).await;
        }
        let purged = self.store.purge_expired().await;
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }

        info!(sub = %identity.sub, "Signing in");
        let sid = self.store.create(identity).await;
        let token = self.keys.sign(&SessionClaims::new(sid, self.store.ttl()))?;
        Ok(jar.add(self.cookie(SESSION_COOKIE, token)))
    }

    pub async fn sign_out(&self, jar: CookieJar) -> CookieJar {
        if let Some(sid) = self.session_id(&jar) {
            if let Some(identity) = self.store.remove(&sid).await {
                info!(sub = %identity.sub, "Signed out");
            }
        }
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    /// Remember the handshake values until the provider redirects back.
    pub fn begin_login(
        &self,
        jar: CookieJar,
        request: &AuthorizationRequest,
    ) -> Result<CookieJar, TokenError> {
        let claims = LoginClaims::new(
            request.state.clone(),
            request.pkce_verifier.clone(),
            Duration::minutes(LOGIN_TTL_MINUTES),
        );
        let token = self.keys.sign(&claims)?;
        Ok(jar.add(self.cookie(LOGIN_COOKIE, token)))
    }

    /// Read and clear the handshake cookie. `None` when missing, tampered or
    /// expired.
    pub fn take_login(&self, jar: CookieJar) -> (CookieJar, Option<LoginClaims>) {
        let claims = jar.get(LOGIN_COOKIE).and_then(|cookie| {
            self.keys
                .verify::<LoginClaims>(cookie.value())
                .inspect_err(|e| debug!("Discarding login cookie: {}", e))
                .ok()
        });
        (jar.remove(Cookie::build(LOGIN_COOKIE).path("/")), claims)
    }

    fn session_id(&self, jar: &CookieJar) -> Option<String> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match self.keys.verify::<SessionClaims>(cookie.value()) {
            Ok(claims) => Some(claims.sid),
            Err(e) => {
                debug!("Ignoring session cookie: {}", e);
                None
            }
        }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build()
    }
}
