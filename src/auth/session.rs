use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::Identity;

struct SessionEntry {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

/// Server-side sessions: opaque token -> authenticated identity.
///
/// Expired entries are dropped when read; `purge_expired` sweeps the rest.
pub struct SessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Bind `identity` to a fresh token.
    pub async fn create(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        let mut entries = self.entries.write().await;
        entries.insert(
            token.clone(),
            SessionEntry {
                identity,
                expires_at: now + self.ttl,
            },
        );
        debug!("Session created ({} active)", entries.len());
        token
    }

    pub async fn get(&self, token: &str) -> Option<Identity> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.identity.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.entries.write().await.remove(token);
        debug!("Session expired");
        None
    }

    pub async fn remove(&self, token: &str) -> Option<Identity> {
        self.entries
            .write()
            .await
            .remove(token)
            .map(|entry| entry.identity)
    }

    /// Returns how many entries were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Identity {
        Identity {
            sub: "auth0|ada".to_string(),
            name: "Ada".to_string(),
            picture: None,
        }
    }

    #[tokio::test]
    async fn create_get_remove() {
        let store = SessionStore::new(Duration::hours(1));
        let token = store.create(ada()).await;

        assert_eq!(store.get(&token).await, Some(ada()));
        assert_eq!(store.remove(&token).await, Some(ada()));
        assert_eq!(store.get(&token).await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn tokens_are_distinct() {
        let store = SessionStore::new(Duration::hours(1));
        let a = store.create(ada()).await;
        let b = store.create(ada()).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn expired_sessions_read_as_anonymous() {
        let store = SessionStore::new(Duration::zero());
        let token = store.create(ada()).await;

        assert_eq!(store.get(&token).await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let expired = SessionStore::new(Duration::zero());
        expired.create(ada()).await;
        expired.create(ada()).await;
        assert_eq!(expired.purge_expired().await, 2);
        assert!(expired.is_empty().await);

        let live = SessionStore::new(Duration::hours(1));
        live.create(ada()).await;
        assert_eq!(live.purge_expired().await, 0);
        assert_eq!(live.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_token_is_anonymous() {
        let store = SessionStore::new(Duration::hours(1));
        assert_eq!(store.get("nope").await, None);
    }
}
