//! Schema evolution for the `clubs` table.
//!
//! Every step is existence-guarded DDL and the whole list runs on every
//! start, so re-running any prefix of it is a no-op.

use sqlx::PgPool;
use tracing::{debug, info};

use super::manager::DatabaseError;

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Applied in order. Steps may only add structure.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_clubs",
        sql: r#"
            CREATE TABLE IF NOT EXISTS clubs (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                sport VARCHAR(50) NOT NULL,
                description TEXT
            )
        "#,
    },
    Migration {
        version: 2,
        name: "add_organizational_number",
        sql: "ALTER TABLE clubs ADD COLUMN IF NOT EXISTS organizational_number VARCHAR(20)",
    },
];

/// Bring the schema up to the latest version.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for migration in MIGRATIONS {
        debug!(version = migration.version, name = migration.name, "Applying schema step");
        sqlx::query(migration.sql)
            .execute(pool)
            .await
            .map_err(|source| DatabaseError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
    }

    info!("Schema is at version {}", latest_version());
    Ok(())
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
