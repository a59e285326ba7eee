use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{PickupError, PickupResult};
use crate::util::non_blank;

/// The comment thread attached to each event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: Uuid,
    pub event_id: Uuid,
}

impl Discussion {
    pub async fn with_id(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        db.discussion_with_id(id)
            .await?
            .ok_or_else(|| PickupError::not_found("Discussion not found."))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    /// The author
    pub user_id: Uuid,
    pub discussion_id: Uuid,
    /// The top-level comment this replies to, if it is a reply
    pub parent_comment_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub async fn with_id(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        db.comment_with_id(id)
            .await?
            .ok_or_else(|| PickupError::not_found("Comment not found."))
    }

    pub fn new(
        text: String,
        author: Uuid,
        discussion: Uuid,
        parent: Option<Uuid>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            user_id: author,
            discussion_id: discussion,
            parent_comment_id: parent,
            created_at: now,
        }
    }

    /// Builds a reply. Threads are one level deep, so replying to a reply
    /// lands on the thread's top-level comment.
    pub fn reply(&self, text: String, author: Uuid, now: OffsetDateTime) -> Self {
        let root = self.parent_comment_id.unwrap_or(self.id);
        Self::new(text, author, self.discussion_id, Some(root), now)
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: Option<String>,
}

impl CommentForm {
    pub fn text(&self, missing: &str) -> PickupResult<String> {
        non_blank(&self.text)
            .map(str::to_owned)
            .ok_or_else(|| PickupError::bad_request(missing))
    }
}

#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionThread {
    pub id: Uuid,
    pub event_id: Uuid,
    pub comments: Vec<CommentThread>,
}

impl DiscussionThread {
    /// Groups comments under their top-level parents. Both levels keep the
    /// order comments were given in.
    pub fn new(discussion: Discussion, comments: Vec<Comment>) -> Self {
        let (replies, top_level): (Vec<Comment>, Vec<Comment>) = comments
            .into_iter()
            .partition(|comment| comment.parent_comment_id.is_some());

        let mut threads: Vec<CommentThread> = top_level
            .into_iter()
            .map(|comment| CommentThread {
                comment,
                replies: Vec::new(),
            })
            .collect();

        for reply in replies {
            if let Some(thread) = threads
                .iter_mut()
                .find(|thread| Some(thread.comment.id) == reply.parent_comment_id)
            {
                thread.replies.push(reply);
            }
        }

        Self {
            id: discussion.id,
            event_id: discussion.event_id,
            comments: threads,
        }
    }
}
