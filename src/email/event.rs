use askama::Template;

use crate::email::Email;
use crate::models::event::Event;
use crate::models::user::User;
use crate::util::format_event_date;

#[derive(Template)]
#[template(path = "event-confirmation.html")]
pub struct EventConfirmationEmail<'a> {
    pub user: &'a User,
    pub event: &'a Event,
    pub when: String,
}

impl<'a> EventConfirmationEmail<'a> {
    pub fn new(user: &'a User, event: &'a Event) -> Self {
        Self {
            user,
            event,
            when: format_event_date(event.date),
        }
    }
}

impl<'a> Email for EventConfirmationEmail<'a> {
    fn subject(&self) -> String {
        format!("You're confirmed for {}!", self.event.title)
    }

    fn recipient(&self) -> &User {
        self.user
    }
}

/// Sent when a spot opens up and a waitlisted player is moved onto the roster.
#[derive(Template)]
#[template(path = "off-waiting-list.html")]
pub struct OffWaitlistEmail<'a> {
    pub user: &'a User,
    pub event: &'a Event,
    pub when: String,
}

impl<'a> OffWaitlistEmail<'a> {
    pub fn new(user: &'a User, event: &'a Event) -> Self {
        Self {
            user,
            event,
            when: format_event_date(event.date),
        }
    }
}

impl<'a> Email for OffWaitlistEmail<'a> {
    fn subject(&self) -> String {
        format!(
            "You've been taken off the waiting list for {}!",
            self.event.title
        )
    }

    fn recipient(&self) -> &User {
        self.user
    }
}

#[derive(Template)]
#[template(path = "event-cancelled.html")]
pub struct EventCancelledEmail<'a> {
    pub user: &'a User,
    pub event: &'a Event,
    pub when: String,
}

impl<'a> EventCancelledEmail<'a> {
    pub fn new(user: &'a User, event: &'a Event) -> Self {
        Self {
            user,
            event,
            when: format_event_date(event.date),
        }
    }
}

impl<'a> Email for EventCancelledEmail<'a> {
    fn subject(&self) -> String {
        format!("{} has been cancelled", self.event.title)
    }

    fn recipient(&self) -> &User {
        self.user
    }
}
