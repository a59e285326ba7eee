use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::db::Database;
use crate::error::PickupResult;
use crate::util::current_time;

/// A login. The token is handed to the client and sent back as a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Issues a fresh token for the user, clearing out expired ones first.
    pub async fn generate(
        user_id: Uuid,
        lifetime: Duration,
        db: &dyn Database,
    ) -> PickupResult<String> {
        let now = current_time();
        db.delete_expired_sessions(now).await?;

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + lifetime,
        };
        db.create_session(&session).await?;

        Ok(session.token)
    }

    /// The user a token belongs to. Expired tokens are removed on sight.
    pub async fn user_for_token(token: &str, db: &dyn Database) -> PickupResult<Option<Uuid>> {
        match db.session_with_token(token).await? {
            Some(session) if session.is_expired(current_time()) => {
                db.delete_session(token).await?;
                Ok(None)
            }
            Some(session) => Ok(Some(session.user_id)),
            None => Ok(None),
        }
    }

    pub async fn remove(token: &str, db: &dyn Database) -> PickupResult<()> {
        db.delete_session(token).await
    }
}
