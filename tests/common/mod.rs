#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use url::Url;

use club_registry::auth::{AuthorizationRequest, Identity, IdentityProvider, ProviderError, SessionGate};
use club_registry::clubs::{Club, ClubChanges, ClubError, ClubService, ClubStore};
use club_registry::config::{SecurityConfig, SessionConfig};
use club_registry::{app, AppState};

pub const GOOD_CODE: &str = "good-code";

/// In-memory clubs table with the same constraints the real one enforces:
/// NOT NULL name/sport, length limits, ids never reused.
#[derive(Default)]
pub struct MemoryClubStore {
    rows: Mutex<(i32, BTreeMap<i32, Club>)>,
    calls: AtomicUsize,
}

impl MemoryClubStore {
    /// Number of store operations reached so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<Club> {
        self.rows.lock().unwrap().1.values().cloned().collect()
    }

    fn check(changes: &ClubChanges) -> Result<(String, String), ClubError> {
        let name = changes.name.clone().ok_or_else(|| {
            ClubError::Storage("null value in column \"name\" violates not-null constraint".into())
        })?;
        let sport = changes.sport.clone().ok_or_else(|| {
            ClubError::Storage("null value in column \"sport\" violates not-null constraint".into())
        })?;
        if name.chars().count() > 100 || sport.chars().count() > 50 {
            return Err(ClubError::Storage("value too long for type character varying".into()));
        }
        if changes.organizational_number.chars().count() > 20 {
            return Err(ClubError::Storage("value too long for type character varying(20)".into()));
        }
        Ok((name, sport))
    }
}

#[async_trait]
impl ClubStore for MemoryClubStore {
    async fn list(&self) -> Result<Vec<Club>, ClubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows())
    }

    async fn insert(&self, changes: &ClubChanges) -> Result<i32, ClubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.rows.lock().unwrap();
        // Like a sequence, a failed insert still consumes an id
        guard.0 += 1;
        let id = guard.0;
        let (name, sport) = Self::check(changes)?;
        guard.1.insert(
            id,
            Club {
                id,
                name,
                sport,
                description: changes.description.clone(),
                organizational_number: Some(changes.organizational_number.clone()),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i32, changes: &ClubChanges) -> Result<(), ClubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.rows.lock().unwrap();
        if !guard.1.contains_key(&id) {
            return Err(ClubError::NotFound(id.into()));
        }
        let (name, sport) = Self::check(changes)?;
        guard.1.insert(
            id,
            Club {
                id,
                name,
                sport,
                description: changes.description.clone(),
                organizational_number: Some(changes.organizational_number.clone()),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), ClubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.rows.lock().unwrap().1.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ClubError::NotFound(id.into())),
        }
    }

    async fn ping(&self) -> Result<(), ClubError> {
        Ok(())
    }
}

/// Accepts `GOOD_CODE` and nothing else.
pub struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorize(&self) -> AuthorizationRequest {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let mut url = Url::parse("http://idp.test/authorize").unwrap();
        url.query_pairs_mut().append_pair("state", &state);
        AuthorizationRequest {
            url,
            state,
            pkce_verifier: "verifier".to_string(),
        }
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<Identity, ProviderError> {
        if code == GOOD_CODE && pkce_verifier == "verifier" {
            Ok(ada())
        } else {
            Err(ProviderError::Exchange("invalid_grant".to_string()))
        }
    }

    fn logout_url(&self, return_to: &str) -> Url {
        let mut url = Url::parse("http://idp.test/v2/logout").unwrap();
        url.query_pairs_mut().append_pair("returnTo", return_to);
        url
    }
}

pub fn ada() -> Identity {
    Identity {
        sub: "auth0|ada".to_string(),
        name: "Ada".to_string(),
        picture: Some("https://example.com/ada.png".to_string()),
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryClubStore>,
    pub sessions: SessionGate,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Serve the router in-process on a free port. The server lives as long as
/// the test's runtime.
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(MemoryClubStore::default());
    let sessions = SessionGate::new(&SessionConfig {
        secret: "integration-secret".to_string(),
        ttl_hours: 1,
        cookie_secure: false,
    })?;
    let state = AppState::new(
        ClubService::new(store.clone()),
        sessions.clone(),
        Arc::new(StubProvider),
        base_url.clone(),
    );
    let security = SecurityConfig {
        enable_cors: false,
        cors_origins: Vec::new(),
    };

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state, &security)).await;
    });

    let server = TestServer {
        port,
        base_url,
        store,
        sessions,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// Client that leaves redirects to the test.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// `name=value` of the named cookie from a response's Set-Cookie headers.
pub fn set_cookie(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}

pub fn location(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Walk /login -> /callback and return the session cookie pair.
pub async fn login(server: &TestServer, client: &reqwest::Client) -> Result<String> {
    let res = client.get(server.url("/login")).send().await?;
    anyhow::ensure!(res.status() == StatusCode::TEMPORARY_REDIRECT, "login status {}", res.status());

    let login_cookie = set_cookie(&res, "club_login").context("missing login cookie")?;
    let authorize = Url::parse(&location(&res).context("missing location")?)?;
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .context("missing state")?;

    let res = client
        .get(server.url("/callback"))
        .query(&[("code", GOOD_CODE), ("state", state.as_str())])
        .header(header::COOKIE, login_cookie)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::SEE_OTHER, "callback status {}", res.status());

    set_cookie(&res, "club_session").context("missing session cookie")
}
