use askama::Template;

use crate::email::Email;
use crate::models::discussion::Comment;
use crate::models::event::Event;
use crate::models::user::User;

/// Tells a host someone commented on their event.
#[derive(Template)]
#[template(path = "new-comment.html")]
pub struct NewCommentEmail<'a> {
    pub host: &'a User,
    pub commenter: &'a User,
    pub event: &'a Event,
    pub comment: &'a Comment,
}

impl<'a> NewCommentEmail<'a> {
    pub fn new(
        host: &'a User,
        commenter: &'a User,
        event: &'a Event,
        comment: &'a Comment,
    ) -> Self {
        Self {
            host,
            commenter,
            event,
            comment,
        }
    }
}

impl<'a> Email for NewCommentEmail<'a> {
    fn subject(&self) -> String {
        format!("New comment on {}", self.event.title)
    }

    fn recipient(&self) -> &User {
        self.host
    }
}

#[derive(Template)]
#[template(path = "new-reply.html")]
pub struct NewReplyEmail<'a> {
    pub parent_author: &'a User,
    pub parent: &'a Comment,
    pub replier: &'a User,
    pub event: &'a Event,
    pub reply: &'a Comment,
}

impl<'a> NewReplyEmail<'a> {
    pub fn new(
        parent_author: &'a User,
        parent: &'a Comment,
        replier: &'a User,
        event: &'a Event,
        reply: &'a Comment,
    ) -> Self {
        Self {
            parent_author,
            parent,
            replier,
            event,
            reply,
        }
    }
}

impl<'a> Email for NewReplyEmail<'a> {
    fn subject(&self) -> String {
        format!("New reply on {}", self.event.title)
    }

    fn recipient(&self) -> &User {
        self.parent_author
    }
}
