use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tracing::{debug, error};

use super::{Club, ClubChanges, ClubError};
use crate::database::DatabaseManager;

/// Storage seam for the club record service. Each call is one unit of work.
#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Every row, in whatever order storage returns them.
    async fn list(&self) -> Result<Vec<Club>, ClubError>;

    /// Insert a row and return the id storage assigned.
    async fn insert(&self, changes: &ClubChanges) -> Result<i32, ClubError>;

    /// Replace all mutable fields of `id`. `NotFound` when no row matched.
    async fn update(&self, id: i32, changes: &ClubChanges) -> Result<(), ClubError>;

    /// `NotFound` when no row matched.
    async fn delete(&self, id: i32) -> Result<(), ClubError>;

    async fn ping(&self) -> Result<(), ClubError>;
}

pub struct PgClubStore {
    db: DatabaseManager,
}

impl PgClubStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClubStore for PgClubStore {
    async fn list(&self) -> Result<Vec<Club>, ClubError> {
        let mut conn = self.db.acquire().await?;
        let clubs = sqlx::query_as::<_, Club>(
            "SELECT id, name, sport, description, organizational_number FROM clubs",
        )
        .fetch_all(&mut *conn)
        .await?;

        debug!("Listed {} clubs", clubs.len());
        Ok(clubs)
    }

    async fn insert(&self, changes: &ClubChanges) -> Result<i32, ClubError> {
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO clubs (name, sport, description, organizational_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.sport)
        .bind(&changes.description)
        .bind(&changes.organizational_number)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(id) => {
                tx.commit().await?;
                debug!("Inserted club {}", id);
                Ok(id)
            }
            Err(err) => Err(rollback(tx, err).await),
        }
    }

    async fn update(&self, id: i32, changes: &ClubChanges) -> Result<(), ClubError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE clubs
            SET name = $1, sport = $2, description = $3, organizational_number = $4
            WHERE id = $5
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.sport)
        .bind(&changes.description)
        .bind(&changes.organizational_number)
        .bind(id)
        .execute(&mut *tx)
        .await;

        match updated {
            // Nothing was written; dropping the transaction releases it
            Ok(result) if result.rows_affected() == 0 => Err(ClubError::NotFound(id.into())),
            Ok(_) => {
                tx.commit().await?;
                debug!("Updated club {}", id);
                Ok(())
            }
            Err(err) => Err(rollback(tx, err).await),
        }
    }

    async fn delete(&self, id: i32) -> Result<(), ClubError> {
        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match deleted {
            Ok(result) if result.rows_affected() == 0 => Err(ClubError::NotFound(id.into())),
            Ok(_) => {
                tx.commit().await?;
                debug!("Deleted club {}", id);
                Ok(())
            }
            Err(err) => Err(rollback(tx, err).await),
        }
    }

    async fn ping(&self) -> Result<(), ClubError> {
        Ok(self.db.health_check().await?)
    }
}

/// Roll back after a failed statement and surface the statement's error.
async fn rollback(tx: Transaction<'static, Postgres>, err: sqlx::Error) -> ClubError {
    error!("Statement failed, rolling back: {}", err);
    if let Err(rollback_err) = tx.rollback().await {
        error!("Rollback failed: {}", rollback_err);
    }
    ClubError::from(err)
}
