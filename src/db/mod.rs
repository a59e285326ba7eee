//! Storage for the API.
//!
//! Handlers only see the [Database] trait. [PgDatabase] is the production
//! store; [MemoryDatabase] backs local development without Postgres and the
//! test suite. Both apply roster changes atomically per event, so capacity
//! checks can't race each other.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::PickupResult;
use crate::models::discussion::{Comment, Discussion};
use crate::models::event::{Event, EventChanges, EventFilter, RosterChange, RosterUpdate};
use crate::models::school::School;
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserChanges};

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

#[async_trait]
pub trait Database: Send + Sync {
    // Schools
    async fn schools(&self) -> PickupResult<Vec<School>>;
    async fn school_with_id(&self, id: Uuid) -> PickupResult<Option<School>>;
    async fn school_with_email_domain(&self, domain: &str) -> PickupResult<Option<School>>;

    // Users
    async fn user_with_id(&self, id: Uuid) -> PickupResult<Option<User>>;
    async fn user_with_email(&self, email: &str) -> PickupResult<Option<User>>;
    /// Inserts the user and bumps their school's user count together.
    async fn create_user(&self, new_user: NewUser, now: OffsetDateTime) -> PickupResult<User>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> PickupResult<Option<User>>;
    /// Marks the user verified when `token` matches the one they were
    /// emailed. `None` means no user has that id and token.
    async fn mark_email_verified(&self, id: Uuid, token: &str) -> PickupResult<Option<User>>;

    // Sessions
    async fn create_session(&self, session: &Session) -> PickupResult<()>;
    async fn session_with_token(&self, token: &str) -> PickupResult<Option<Session>>;
    async fn delete_session(&self, token: &str) -> PickupResult<()>;
    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> PickupResult<()>;

    // Events, ordered by date
    async fn events(&self, filter: EventFilter) -> PickupResult<Vec<Event>>;
    async fn event_with_id(&self, id: Uuid) -> PickupResult<Option<Event>>;
    /// Inserts the event along with its empty discussion.
    async fn create_event(&self, event: Event) -> PickupResult<Event>;
    /// Applies host changes under the event's lock, returning the updated
    /// event and anyone promoted off the waitlist.
    async fn update_event(&self, id: Uuid, changes: EventChanges) -> PickupResult<RosterUpdate>;
    /// Applies a roster change under the event's lock.
    async fn change_roster(&self, id: Uuid, change: RosterChange) -> PickupResult<RosterUpdate>;
    /// Deletes the event with its discussion and comments.
    async fn delete_event(&self, id: Uuid) -> PickupResult<bool>;

    // Discussions, comments ordered by creation
    async fn discussion_with_id(&self, id: Uuid) -> PickupResult<Option<Discussion>>;
    async fn discussion_for_event(&self, event_id: Uuid) -> PickupResult<Option<Discussion>>;
    async fn comments_in_discussion(&self, discussion_id: Uuid) -> PickupResult<Vec<Comment>>;
    async fn comments_by_user(&self, user_id: Uuid) -> PickupResult<Vec<Comment>>;
    async fn comment_with_id(&self, id: Uuid) -> PickupResult<Option<Comment>>;
    async fn create_comment(&self, comment: Comment) -> PickupResult<Comment>;
    /// Deletes the comment and its replies.
    async fn delete_comment(&self, id: Uuid) -> PickupResult<bool>;
}
