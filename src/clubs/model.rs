use serde::{Deserialize, Serialize};

use super::ClubError;

pub const ORGANIZATIONAL_NUMBER: &str = "organizational_number";

/// A row of the `clubs` table.
///
/// `organizational_number` stays optional on the read side: rows written
/// before the column existed keep NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Club {
    pub id: i32,
    pub name: String,
    pub sport: String,
    pub description: Option<String>,
    pub organizational_number: Option<String>,
}

/// Client payload for create and update.
///
/// `name` and `sport` are optional here; the NOT NULL constraints reject
/// their absence at insert/update time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubInput {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub description: Option<String>,
    pub organizational_number: Option<String>,
}

/// Validated field set written by insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubChanges {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub description: Option<String>,
    pub organizational_number: String,
}

impl ClubInput {
    pub fn validate(self) -> Result<ClubChanges, ClubError> {
        let organizational_number = match self.organizational_number {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                return Err(ClubError::Validation {
                    field: ORGANIZATIONAL_NUMBER,
                    message: "Organizational number is required".to_string(),
                })
            }
        };

        Ok(ClubChanges {
            name: self.name,
            sport: self.sport,
            description: self.description,
            organizational_number,
        })
    }
}
