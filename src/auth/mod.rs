pub mod gate;
pub mod provider;
pub mod session;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use gate::SessionGate;
pub use provider::{Auth0Provider, AuthorizationRequest, IdentityProvider, ProviderError};
pub use session::SessionStore;

/// Authenticated caller as asserted by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider subject identifier
    pub sub: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Contents of the session cookie. Only points into the session store.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(sid: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sid,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Carried between `/login` and `/callback`
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginClaims {
    pub state: String,
    pub verifier: String,
    pub exp: i64,
}

impl LoginClaims {
    pub fn new(state: String, verifier: String, ttl: Duration) -> Self {
        Self {
            state,
            verifier,
            exp: (Utc::now() + ttl).timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    InvalidSecret,
    Signing(String),
    Invalid(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::InvalidSecret => write!(f, "Invalid session secret"),
            TokenError::Signing(msg) => write!(f, "Token signing error: {}", msg),
            TokenError::Invalid(msg) => write!(f, "Invalid token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// HS256 keys derived from the session secret
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature and `exp`.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
