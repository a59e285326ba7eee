use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::seed::default_schools;
use crate::db::Database;
use crate::error::{PickupError, PickupResult};
use crate::models::discussion::{Comment, Discussion};
use crate::models::event::{Event, EventChanges, EventFilter, RosterChange, RosterUpdate};
use crate::models::school::School;
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserChanges};

#[derive(Default)]
struct Tables {
    schools: Vec<School>,
    users: Vec<User>,
    sessions: Vec<Session>,
    events: Vec<Event>,
    discussions: Vec<Discussion>,
    comments: Vec<Comment>,
}

/// An in-process store. One lock covers every table, which makes each
/// operation atomic just like a transaction would.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn with_schools(schools: Vec<School>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                schools,
                ..Default::default()
            }),
        }
    }

    /// A store preloaded with the default schools.
    pub fn seeded() -> Self {
        Self::with_schools(default_schools())
    }

    fn lock(&self) -> PickupResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PickupError::Server("In-memory store was poisoned".to_owned()))
    }
}

fn event_mut<'t>(tables: &'t mut Tables, id: Uuid) -> PickupResult<&'t mut Event> {
    tables
        .events
        .iter_mut()
        .find(|event| event.id == id)
        .ok_or_else(|| PickupError::not_found("Event not found."))
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn schools(&self) -> PickupResult<Vec<School>> {
        let mut schools = self.lock()?.schools.clone();
        schools.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(schools)
    }

    async fn school_with_id(&self, id: Uuid) -> PickupResult<Option<School>> {
        Ok(self.lock()?.schools.iter().find(|school| school.id == id).cloned())
    }

    async fn school_with_email_domain(&self, domain: &str) -> PickupResult<Option<School>> {
        Ok(self
            .lock()?
            .schools
            .iter()
            .find(|school| school.email_domain.eq_ignore_ascii_case(domain))
            .cloned())
    }

    async fn user_with_id(&self, id: Uuid) -> PickupResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|user| user.id == id).cloned())
    }

    async fn user_with_email(&self, email: &str) -> PickupResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser, now: OffsetDateTime) -> PickupResult<User> {
        let mut tables = self.lock()?;
        if tables
            .users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(PickupError::bad_request(
                "Account with email address already exists.",
            ));
        }

        let school = tables
            .schools
            .iter_mut()
            .find(|school| school.id == new_user.school_id)
            .ok_or_else(|| PickupError::bad_request("Invalid university email."))?;
        school.num_users += 1;

        let user = new_user.into_user(now);
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> PickupResult<Option<User>> {
        let mut tables = self.lock()?;
        Ok(tables
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .map(|user| {
                user.apply(changes);
                user.clone()
            }))
    }

    async fn mark_email_verified(&self, id: Uuid, token: &str) -> PickupResult<Option<User>> {
        let mut tables = self.lock()?;
        Ok(tables
            .users
            .iter_mut()
            .find(|user| user.id == id && user.verification_token.as_deref() == Some(token))
            .map(|user| {
                user.email_verified = true;
                user.clone()
            }))
    }

    async fn create_session(&self, session: &Session) -> PickupResult<()> {
        self.lock()?.sessions.push(session.clone());
        Ok(())
    }

    async fn session_with_token(&self, token: &str) -> PickupResult<Option<Session>> {
        Ok(self
            .lock()?
            .sessions
            .iter()
            .find(|session| session.token == token)
            .cloned())
    }

    async fn delete_session(&self, token: &str) -> PickupResult<()> {
        self.lock()?.sessions.retain(|session| session.token != token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> PickupResult<()> {
        self.lock()?.sessions.retain(|session| !session.is_expired(now));
        Ok(())
    }

    async fn events(&self, filter: EventFilter) -> PickupResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .lock()?
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.date);

        Ok(events)
    }

    async fn event_with_id(&self, id: Uuid) -> PickupResult<Option<Event>> {
        Ok(self.lock()?.events.iter().find(|event| event.id == id).cloned())
    }

    async fn create_event(&self, event: Event) -> PickupResult<Event> {
        let mut tables = self.lock()?;
        tables.discussions.push(Discussion {
            id: Uuid::new_v4(),
            event_id: event.id,
        });
        tables.events.push(event.clone());

        Ok(event)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> PickupResult<RosterUpdate> {
        let mut tables = self.lock()?;
        let event = event_mut(&mut tables, id)?;

        let mut updated = event.clone();
        let promoted = updated.apply_changes(changes)?;
        *event = updated.clone();

        Ok(RosterUpdate {
            event: updated,
            promoted,
        })
    }

    async fn change_roster(&self, id: Uuid, change: RosterChange) -> PickupResult<RosterUpdate> {
        let mut tables = self.lock()?;
        let event = event_mut(&mut tables, id)?;

        let mut updated = event.clone();
        let promoted = updated.apply_roster_change(change)?;
        *event = updated.clone();

        Ok(RosterUpdate {
            event: updated,
            promoted,
        })
    }

    async fn delete_event(&self, id: Uuid) -> PickupResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.events.len();
        tables.events.retain(|event| event.id != id);
        if tables.events.len() == before {
            return Ok(false);
        }

        let discussions: Vec<Uuid> = tables
            .discussions
            .iter()
            .filter(|discussion| discussion.event_id == id)
            .map(|discussion| discussion.id)
            .collect();
        tables
            .discussions
            .retain(|discussion| discussion.event_id != id);
        tables
            .comments
            .retain(|comment| !discussions.contains(&comment.discussion_id));

        Ok(true)
    }

    async fn discussion_with_id(&self, id: Uuid) -> PickupResult<Option<Discussion>> {
        Ok(self
            .lock()?
            .discussions
            .iter()
            .find(|discussion| discussion.id == id)
            .cloned())
    }

    async fn discussion_for_event(&self, event_id: Uuid) -> PickupResult<Option<Discussion>> {
        Ok(self
            .lock()?
            .discussions
            .iter()
            .find(|discussion| discussion.event_id == event_id)
            .cloned())
    }

    async fn comments_in_discussion(&self, discussion_id: Uuid) -> PickupResult<Vec<Comment>> {
        Ok(self
            .lock()?
            .comments
            .iter()
            .filter(|comment| comment.discussion_id == discussion_id)
            .cloned()
            .collect())
    }

    async fn comments_by_user(&self, user_id: Uuid) -> PickupResult<Vec<Comment>> {
        Ok(self
            .lock()?
            .comments
            .iter()
            .filter(|comment| comment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn comment_with_id(&self, id: Uuid) -> PickupResult<Option<Comment>> {
        Ok(self
            .lock()?
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .cloned())
    }

    async fn create_comment(&self, comment: Comment) -> PickupResult<Comment> {
        let mut tables = self.lock()?;
        if !tables
            .discussions
            .iter()
            .any(|discussion| discussion.id == comment.discussion_id)
        {
            return Err(PickupError::not_found("Discussion not found."));
        }
        tables.comments.push(comment.clone());

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> PickupResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.comments.len();
        tables
            .comments
            .retain(|comment| comment.id != id && comment.parent_comment_id != Some(id));

        Ok(tables.comments.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tests::mock::{mock_event, mock_new_user};
    use crate::util::current_time;

    #[tokio::test]
    async fn registering_counts_users_per_school() {
        let db = MemoryDatabase::seeded();
        let school = db.school_with_email_domain("GATECH.EDU").await.unwrap().unwrap();

        let user = db
            .create_user(mock_new_user(school.id), current_time())
            .await
            .unwrap();

        assert!(!user.email_verified);
        let school = db.school_with_id(school.id).await.unwrap().unwrap();
        assert_eq!(school.num_users, 1);
    }

    #[tokio::test]
    async fn emails_are_unique_regardless_of_case() {
        let db = MemoryDatabase::seeded();
        let school = db.school_with_email_domain("gatech.edu").await.unwrap().unwrap();
        db.create_user(mock_new_user(school.id), current_time())
            .await
            .unwrap();

        let duplicate = NewUser {
            email: "BUZZ@gatech.edu".to_owned(),
            ..mock_new_user(school.id)
        };
        let error = db.create_user(duplicate, current_time()).await.unwrap_err();

        assert_eq!(error.to_string(), "Account with email address already exists.");
        let school = db.school_with_id(school.id).await.unwrap().unwrap();
        assert_eq!(school.num_users, 1);
    }

    #[tokio::test]
    async fn verification_needs_the_emailed_token() {
        let db = MemoryDatabase::seeded();
        let school = db.school_with_email_domain("gatech.edu").await.unwrap().unwrap();
        let user = db
            .create_user(mock_new_user(school.id), current_time())
            .await
            .unwrap();
        let token = user.verification_token.clone().unwrap();

        assert_eq!(db.mark_email_verified(user.id, "guess").await.unwrap(), None);
        assert_eq!(db.mark_email_verified(user.id, "").await.unwrap(), None);

        let verified = db.mark_email_verified(user.id, &token).await.unwrap().unwrap();
        assert!(verified.email_verified);
    }

    #[tokio::test]
    async fn concurrent_joins_never_overfill_an_event() {
        let db = Arc::new(MemoryDatabase::seeded());
        let mut event = mock_event();
        event.max_players = 5;
        let event_id = db.create_event(event).await.unwrap().id;

        let joins = (0..20).map(|_| {
            let db = db.clone();
            tokio::spawn(async move {
                db.change_roster(event_id, RosterChange::Join(Uuid::new_v4()))
                    .await
                    .is_ok()
            })
        });
        let mut joined = 0;
        for join in joins.collect::<Vec<_>>() {
            if join.await.unwrap() {
                joined += 1;
            }
        }

        assert_eq!(joined, 4);
        let event = db.event_with_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.users_joined_ids.len(), 5);
    }

    #[tokio::test]
    async fn failed_roster_changes_leave_the_event_alone() {
        let db = MemoryDatabase::seeded();
        let event = db.create_event(mock_event()).await.unwrap();

        let result = db
            .change_roster(event.id, RosterChange::Leave(Uuid::new_v4()))
            .await;
        assert!(result.is_err());
        assert_eq!(db.event_with_id(event.id).await.unwrap().unwrap(), event);
    }

    #[tokio::test]
    async fn deleting_an_event_removes_its_discussion() {
        let db = MemoryDatabase::seeded();
        let event = db.create_event(mock_event()).await.unwrap();
        let discussion = db.discussion_for_event(event.id).await.unwrap().unwrap();
        let comment = Comment::new(
            "See you there".to_owned(),
            event.host_id,
            discussion.id,
            None,
            current_time(),
        );
        db.create_comment(comment.clone()).await.unwrap();

        assert!(db.delete_event(event.id).await.unwrap());
        assert!(!db.delete_event(event.id).await.unwrap());
        assert_eq!(db.discussion_with_id(discussion.id).await.unwrap(), None);
        assert_eq!(db.comment_with_id(comment.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_replies() {
        let db = MemoryDatabase::seeded();
        let event = db.create_event(mock_event()).await.unwrap();
        let discussion = db.discussion_for_event(event.id).await.unwrap().unwrap();
        let now = current_time();
        let root = Comment::new("root".to_owned(), event.host_id, discussion.id, None, now);
        let reply = root.reply("reply".to_owned(), Uuid::new_v4(), now);
        db.create_comment(root.clone()).await.unwrap();
        db.create_comment(reply).await.unwrap();

        assert!(db.delete_comment(root.id).await.unwrap());
        assert!(db
            .comments_in_discussion(discussion.id)
            .await
            .unwrap()
            .is_empty());
    }
}
