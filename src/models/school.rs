use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{PickupError, PickupResult};

/// A university. Students are matched to their school by email domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: Uuid,
    pub name: String,
    /// The domain of student email addresses, e.g. `gatech.edu`
    pub email_domain: String,
    pub num_users: i32,
}

impl School {
    pub fn new(name: impl Into<String>, email_domain: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email_domain: email_domain.into(),
            num_users: 0,
        }
    }

    pub async fn with_id(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        db.school_with_id(id)
            .await?
            .ok_or_else(|| PickupError::not_found("School not found"))
    }
}
