use std::sync::Arc;

use crate::auth::{IdentityProvider, SessionGate};
use crate::clubs::ClubService;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub clubs: ClubService,
    pub sessions: SessionGate,
    pub provider: Arc<dyn IdentityProvider>,
    /// Where the provider sends the browser after logout
    pub public_url: String,
}

impl AppState {
    pub fn new(
        clubs: ClubService,
        sessions: SessionGate,
        provider: Arc<dyn IdentityProvider>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            clubs,
            sessions,
            provider,
            public_url: public_url.into(),
        }
    }
}
