use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Longest session lifetime accepted from the environment (one year).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally visible base URL, used for the post-logout return address.
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the discrete PG* fields.
    pub url: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub port: Option<u16>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// Identity provider tenant domain, e.g. `example.eu.auth0.com`.
    pub domain: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub secret: String,
    pub ttl_hours: u64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_value(lookup("APP_ENV").as_deref());

        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let provider = ProviderConfig {
            client_id: required("AUTH0_CLIENT_ID")?,
            client_secret: required("AUTH0_CLIENT_SECRET")?,
            domain: required("AUTH0_DOMAIN")?,
            callback_url: String::new(),
        };
        let secret = required("APP_SECRET_KEY")?;

        Ok(Self::preset(environment, provider, secret).with_overrides(lookup))
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        self.server.public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
            .trim_end_matches('/')
            .to_string();
        self.provider.callback_url = lookup("AUTH0_CALLBACK_URL")
            .unwrap_or_else(|| format!("{}/callback", self.server.public_url));

        self.database = self.database.with_overrides(&lookup);

        // Session overrides
        if let Some(v) = lookup("SESSION_TTL_HOURS") {
            self.session.ttl_hours = v
                .parse()
                .ok()
                .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
                .unwrap_or(self.session.ttl_hours);
        }
        if let Some(v) = lookup("SESSION_COOKIE_SECURE") {
            self.session.cookie_secure = v.parse().unwrap_or(self.session.cookie_secure);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn preset(environment: Environment, provider: ProviderConfig, secret: String) -> Self {
        let (session, security) = match environment {
            Environment::Development => (
                SessionConfig { secret, ttl_hours: 24 * 7, cookie_secure: false },
                SecurityConfig {
                    enable_cors: true,
                    cors_origins: vec!["http://localhost:5000".to_string()],
                },
            ),
            Environment::Staging => (
                SessionConfig { secret, ttl_hours: 24, cookie_secure: true },
                SecurityConfig {
                    enable_cors: true,
                    cors_origins: vec!["https://staging.example.com".to_string()],
                },
            ),
            Environment::Production => (
                SessionConfig { secret, ttl_hours: 8, cookie_secure: true },
                SecurityConfig {
                    enable_cors: false,
                    cors_origins: Vec::new(),
                },
            ),
        };

        Self {
            environment,
            server: ServerConfig {
                port: 5000,
                public_url: String::new(),
            },
            database: DatabaseConfig::preset(environment),
            provider,
            session,
            security,
        }
    }
}

impl Environment {
    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl DatabaseConfig {
    /// Database settings alone, for commands that never touch the identity
    /// provider.
    pub fn from_env() -> Self {
        let lookup = |key: &str| env::var(key).ok();
        Self::preset(Environment::from_value(lookup("APP_ENV").as_deref())).with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.url = lookup("DATABASE_URL");
        self.host = lookup("PGHOST");
        self.name = lookup("PGDATABASE");
        self.user = lookup("PGUSER");
        self.password = lookup("PGPASSWORD");
        self.port = lookup("PGPORT").and_then(|v| v.parse().ok());
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.max_connections = v.parse().unwrap_or(self.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.connection_timeout = v.parse().unwrap_or(self.connection_timeout);
        }
        self
    }

    fn preset(environment: Environment) -> Self {
        let (max_connections, connection_timeout) = match environment {
            Environment::Development => (5, 30),
            Environment::Staging => (10, 10),
            Environment::Production => (20, 5),
        };
        Self {
            url: None,
            host: None,
            name: None,
            user: None,
            password: None,
            port: None,
            max_connections,
            connection_timeout,
        }
    }
}
