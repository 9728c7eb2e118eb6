use std::sync::Arc;

use tracing::{info, warn};

use super::{Club, ClubError, ClubInput, ClubStore};

/// CRUD contract for clubs. Input is validated before the store is touched,
/// so a rejected request never opens a transaction.
#[derive(Clone)]
pub struct ClubService {
    store: Arc<dyn ClubStore>,
}

impl ClubService {
    pub fn new(store: Arc<dyn ClubStore>) -> Self {
        Self { store }
    }

    /// All clubs in unspecified order.
    pub async fn list(&self) -> Result<Vec<Club>, ClubError> {
        self.store.list().await
    }

    pub async fn create(&self, input: ClubInput) -> Result<i32, ClubError> {
        let changes = input.validate().inspect_err(|e| warn!("Rejected club create: {}", e))?;
        let id = self.store.insert(&changes).await?;
        info!("Created club {}", id);
        Ok(id)
    }

    pub async fn update(&self, id: i64, input: ClubInput) -> Result<(), ClubError> {
        let changes = input
            .validate()
            .inspect_err(|e| warn!("Rejected update of club {}: {}", id, e))?;
        self.store.update(row_id(id)?, &changes).await?;
        info!("Updated club {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClubError> {
        self.store.delete(row_id(id)?).await?;
        info!("Deleted club {}", id);
        Ok(())
    }

    pub async fn health(&self) -> Result<(), ClubError> {
        self.store.ping().await
    }
}

/// Ids outside the SERIAL column's range cannot match a row.
fn row_id(id: i64) -> Result<i32, ClubError> {
    i32::try_from(id).map_err(|_| ClubError::NotFound(id))
}
