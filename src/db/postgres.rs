use anyhow::Context as _;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{PickupError, PickupResult};
use crate::models::discussion::{Comment, Discussion};
use crate::models::event::{Event, EventChanges, EventFilter, RosterChange, RosterUpdate};
use crate::models::school::School;
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserChanges};

const EVENT_COLUMNS: &str = "id, title, description, date, sport, skill_level, location, coed,
     max_players, host_id, school_id, users_joined_ids, users_waiting_ids, created_at";

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, bio, major,
     favorite_sports, school_year, profile_image, cover_image, email_verified,
     verification_token, event_confirmation_notification, discussion_reply_notification,
     school_id, created_at";

const COMMENT_COLUMNS: &str =
    "id, text, user_id, discussion_id, parent_comment_id, created_at";

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connects and brings the schema up to date.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("Failed to connect to the database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    async fn lock_event(
        id: Uuid,
        tx: &mut Transaction<'_, Postgres>,
    ) -> PickupResult<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| PickupError::not_found("Event not found."))
    }

    async fn save_event(event: &Event, tx: &mut Transaction<'_, Postgres>) -> PickupResult<()> {
        sqlx::query(
            "UPDATE events SET
                 title = $2, description = $3, date = $4, sport = $5, skill_level = $6,
                 location = $7, coed = $8, max_players = $9,
                 users_joined_ids = $10, users_waiting_ids = $11
             WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.sport)
        .bind(&event.skill_level)
        .bind(&event.location)
        .bind(event.coed)
        .bind(event.max_players)
        .bind(event.users_joined_ids.clone())
        .bind(event.users_waiting_ids.clone())
        .execute(&mut *tx)
        .await?;

        Ok(())
    }

    /// Runs `edit` against the locked event row and saves the result, all in
    /// one transaction.
    async fn edit_event<F>(&self, id: Uuid, edit: F) -> PickupResult<RosterUpdate>
    where
        F: FnOnce(&mut Event) -> PickupResult<Vec<Uuid>> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let mut event = Self::lock_event(id, &mut tx).await?;
        let promoted = edit(&mut event)?;
        Self::save_event(&event, &mut tx).await?;
        tx.commit().await?;

        Ok(RosterUpdate { event, promoted })
    }
}

/// Two registrations racing for one email both pass the existence check;
/// the unique index settles it.
fn duplicate_email(err: sqlx::Error) -> PickupError {
    let unique_violation = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    );

    if unique_violation {
        PickupError::bad_request("Account with email address already exists.")
    } else {
        err.into()
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn schools(&self) -> PickupResult<Vec<School>> {
        sqlx::query_as::<_, School>(
            "SELECT id, name, email_domain, num_users FROM schools ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn school_with_id(&self, id: Uuid) -> PickupResult<Option<School>> {
        sqlx::query_as::<_, School>(
            "SELECT id, name, email_domain, num_users FROM schools WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn school_with_email_domain(&self, domain: &str) -> PickupResult<Option<School>> {
        sqlx::query_as::<_, School>(
            "SELECT id, name, email_domain, num_users FROM schools
             WHERE lower(email_domain) = lower($1)",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn user_with_id(&self, id: Uuid) -> PickupResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn user_with_email(&self, email: &str) -> PickupResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_user(&self, new_user: NewUser, now: OffsetDateTime) -> PickupResult<User> {
        let user = new_user.into_user(now);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users
             (id, email, password_hash, first_name, last_name, verification_token,
              school_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.verification_token)
        .bind(user.school_id)
        .bind(user.created_at)
        .execute(&mut tx)
        .await
        .map_err(duplicate_email)?;
        sqlx::query("UPDATE schools SET num_users = num_users + 1 WHERE id = $1")
            .bind(user.school_id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> PickupResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                 first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 bio = COALESCE($4, bio),
                 major = COALESCE($5, major),
                 favorite_sports = COALESCE($6, favorite_sports),
                 school_year = COALESCE($7, school_year),
                 profile_image = COALESCE($8, profile_image),
                 cover_image = COALESCE($9, cover_image),
                 password_hash = COALESCE($10, password_hash),
                 event_confirmation_notification = COALESCE($11, event_confirmation_notification),
                 discussion_reply_notification = COALESCE($12, discussion_reply_notification)
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.bio)
        .bind(changes.major)
        .bind(changes.favorite_sports)
        .bind(changes.school_year)
        .bind(changes.profile_image)
        .bind(changes.cover_image)
        .bind(changes.password_hash)
        .bind(changes.event_confirmation_notification)
        .bind(changes.discussion_reply_notification)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn mark_email_verified(&self, id: Uuid, token: &str) -> PickupResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email_verified = true
             WHERE id = $1 AND verification_token = $2
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_session(&self, session: &Session) -> PickupResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn session_with_token(&self, token: &str) -> PickupResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn delete_session(&self, token: &str) -> PickupResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> PickupResult<()> {
        sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn events(&self, filter: EventFilter) -> PickupResult<Vec<Event>> {
        let select = format!("SELECT {} FROM events", EVENT_COLUMNS);
        let sql = match &filter {
            EventFilter::All => format!("{} ORDER BY date", select),
            EventFilter::Sport(_) => format!("{} WHERE sport = $1 ORDER BY date", select),
            EventFilter::School(_) => format!("{} WHERE school_id = $1 ORDER BY date", select),
            EventFilter::HostedBy(_) => format!("{} WHERE host_id = $1 ORDER BY date", select),
            EventFilter::JoinedBy(_) => {
                format!("{} WHERE $1 = ANY(users_joined_ids) ORDER BY date", select)
            }
            EventFilter::WaitingFor(_) => {
                format!("{} WHERE $1 = ANY(users_waiting_ids) ORDER BY date", select)
            }
        };

        let query = sqlx::query_as::<_, Event>(&sql);
        let query = match filter {
            EventFilter::All => query,
            EventFilter::Sport(sport) => query.bind(sport),
            EventFilter::School(id)
            | EventFilter::HostedBy(id)
            | EventFilter::JoinedBy(id)
            | EventFilter::WaitingFor(id) => query.bind(id),
        };

        query.fetch_all(&self.pool).await.map_err(Into::into)
    }

    async fn event_with_id(&self, id: Uuid) -> PickupResult<Option<Event>> {
        sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn create_event(&self, event: Event) -> PickupResult<Event> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO events ({})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.sport)
        .bind(&event.skill_level)
        .bind(&event.location)
        .bind(event.coed)
        .bind(event.max_players)
        .bind(event.host_id)
        .bind(event.school_id)
        .bind(event.users_joined_ids.clone())
        .bind(event.users_waiting_ids.clone())
        .bind(event.created_at)
        .execute(&mut tx)
        .await?;
        sqlx::query("INSERT INTO discussions (id, event_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(event.id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> PickupResult<RosterUpdate> {
        self.edit_event(id, move |event| event.apply_changes(changes))
            .await
    }

    async fn change_roster(&self, id: Uuid, change: RosterChange) -> PickupResult<RosterUpdate> {
        self.edit_event(id, move |event| event.apply_roster_change(change))
            .await
    }

    async fn delete_event(&self, id: Uuid) -> PickupResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn discussion_with_id(&self, id: Uuid) -> PickupResult<Option<Discussion>> {
        sqlx::query_as::<_, Discussion>("SELECT id, event_id FROM discussions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn discussion_for_event(&self, event_id: Uuid) -> PickupResult<Option<Discussion>> {
        sqlx::query_as::<_, Discussion>(
            "SELECT id, event_id FROM discussions WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn comments_in_discussion(&self, discussion_id: Uuid) -> PickupResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE discussion_id = $1 ORDER BY created_at",
            COMMENT_COLUMNS
        ))
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn comments_by_user(&self, user_id: Uuid) -> PickupResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE user_id = $1 ORDER BY created_at",
            COMMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn comment_with_id(&self, id: Uuid) -> PickupResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE id = $1",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn create_comment(&self, comment: Comment) -> PickupResult<Comment> {
        sqlx::query(&format!(
            "INSERT INTO comments ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            COMMENT_COLUMNS
        ))
        .bind(comment.id)
        .bind(&comment.text)
        .bind(comment.user_id)
        .bind(comment.discussion_id)
        .bind(comment.parent_comment_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> PickupResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
