use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::Identity;
use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid identity provider configuration: {0}")]
    Configuration(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Userinfo request failed: {0}")]
    UserInfo(String),
}

/// Where to send the browser, plus the values `/callback` must see again.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub pkce_verifier: String,
}

/// The identity provider's side of the login handshake.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize(&self) -> AuthorizationRequest;

    /// Trade an authorization code for the caller's identity.
    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<Identity, ProviderError>;

    /// Provider logout endpoint that returns the browser to `return_to`.
    fn logout_url(&self, return_to: &str) -> Url;
}

type Auth0Client = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    nickname: Option<String>,
    picture: Option<String>,
}

impl From<UserInfo> for Identity {
    fn from(info: UserInfo) -> Self {
        let name = info
            .name
            .or(info.nickname)
            .unwrap_or_else(|| info.sub.clone());
        Identity {
            sub: info.sub,
            name,
            picture: info.picture,
        }
    }
}

/// Auth0-style tenant: `/authorize`, `/oauth/token`, `/userinfo`, `/v2/logout`.
pub struct Auth0Provider {
    client: Auth0Client,
    http: reqwest::Client,
    base: Url,
    client_id: String,
}

impl Auth0Provider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base = Self::base_url(&config.domain)?;
        let endpoint = |path: &str| {
            base.join(path)
                .map_err(|e| ProviderError::Configuration(format!("{}: {}", path, e)))
        };

        let redirect = RedirectUrl::new(config.callback_url.clone())
            .map_err(|e| ProviderError::Configuration(format!("callback url: {}", e)))?;

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::from_url(endpoint("authorize")?))
            .set_token_uri(TokenUrl::from_url(endpoint("oauth/token")?))
            .set_redirect_uri(redirect);

        // The token endpoint must not be followed through redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        info!("Identity provider configured for {}", base);
        Ok(Self {
            client,
            http,
            base,
            client_id: config.client_id.clone(),
        })
    }

    fn base_url(domain: &str) -> Result<Url, ProviderError> {
        let domain = domain.trim().trim_end_matches('/');
        let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{}/", domain)
        } else {
            format!("https://{}/", domain)
        };
        Url::parse(&raw).map_err(|e| ProviderError::Configuration(format!("domain: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for Auth0Provider {
    fn authorize(&self) -> AuthorizationRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(challenge)
            .url();

        AuthorizationRequest {
            url,
            state: csrf.secret().to_string(),
            pkce_verifier: verifier.secret().to_string(),
        }
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<Identity, ProviderError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;
        debug!("Authorization code exchanged");

        let userinfo_url = self
            .base
            .join("userinfo")
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        let info: UserInfo = self
            .http
            .get(userinfo_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?;

        Ok(info.into())
    }

    fn logout_url(&self, return_to: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path("/v2/logout");
        url.query_pairs_mut()
            .append_pair("returnTo", return_to)
            .append_pair("client_id", &self.client_id);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Auth0Provider {
        Auth0Provider::new(&ProviderConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            domain: "tenant.example.com".to_string(),
            callback_url: "http://localhost:5000/callback".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_state_and_pkce() {
        let request = provider().authorize();
        assert_eq!(request.url.host_str(), Some("tenant.example.com"));
        assert_eq!(request.url.path(), "/authorize");

        let pairs: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.clone());
        assert_eq!(get("state"), Some(request.state.clone()));
        assert_eq!(get("client_id").as_deref(), Some("client-123"));
        assert_eq!(get("redirect_uri").as_deref(), Some("http://localhost:5000/callback"));
        assert_eq!(get("code_challenge_method").as_deref(), Some("S256"));
        assert!(!request.pkce_verifier.is_empty());
    }

    #[test]
    fn logout_url_returns_to_app() {
        let url = provider().logout_url("http://localhost:5000");
        assert_eq!(url.path(), "/v2/logout");
        let query = url.query().unwrap_or_default();
        assert!(query.contains("returnTo=http%3A%2F%2Flocalhost%3A5000"), "{}", query);
        assert!(query.contains("client_id=client-123"), "{}", query);
    }

    #[test]
    fn explicit_scheme_in_domain_is_kept() {
        let base = Auth0Provider::base_url("http://127.0.0.1:9999/").unwrap();
        assert_eq!(base.as_str(), "http://127.0.0.1:9999/");
    }

    #[test]
    fn userinfo_name_falls_back() {
        let info: UserInfo = serde_json::from_str(r#"{"sub":"auth0|1","nickname":"ada"}"#).unwrap();
        let identity = Identity::from(info);
        assert_eq!(identity.name, "ada");

        let info: UserInfo = serde_json::from_str(r#"{"sub":"auth0|2"}"#).unwrap();
        assert_eq!(Identity::from(info).name, "auth0|2");
    }
}
