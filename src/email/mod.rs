//! Transactional emails.
//!
//! Each message is an [askama] template implementing [Email]. Handlers
//! render one with [send_email], which hands the result to the configured
//! [Mailer] and only logs failures, so a flaky mail provider never fails the
//! request that triggered it.

use anyhow::Context;
use askama::Template;
use async_trait::async_trait;
use mailgun_v3::email::{self, Message, MessageBody};
use mailgun_v3::{Credentials, EmailAddress};

use crate::config::MailConfig;
use crate::models::user::User;

pub mod account;
pub mod discussion;
pub mod event;

pub trait Email: Template {
    fn subject(&self) -> String;
    fn recipient(&self) -> &User;
}

/// A rendered message, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to_name: String,
    pub to_address: String,
    pub subject: String,
    pub html: String,
}

impl OutgoingEmail {
    pub fn render(email: &impl Email) -> anyhow::Result<Self> {
        let recipient = email.recipient();

        Ok(Self {
            to_name: recipient.full_name(),
            to_address: recipient.email.clone(),
            subject: email.subject(),
            html: email.render().context("Failed to render email")?,
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Sends through the Mailgun HTTP API.
pub struct MailgunMailer {
    creds: Credentials,
    sender: EmailAddress,
}

impl MailgunMailer {
    pub fn new(token: &str, config: &MailConfig) -> Self {
        Self {
            creds: Credentials::new(token, config.mailgun_domain.as_str()),
            sender: EmailAddress::name_address(
                config.from_name.as_str(),
                config.from_address.as_str(),
            ),
        }
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn deliver(&self, outgoing: OutgoingEmail) -> anyhow::Result<()> {
        let message = Message {
            to: vec![EmailAddress::name_address(
                outgoing.to_name.as_str(),
                outgoing.to_address.as_str(),
            )],
            subject: outgoing.subject,
            body: MessageBody::Html(outgoing.html),
            ..Default::default()
        };

        email::async_impl::send_email(&self.creds, &self.sender, message)
            .await
            .map(|_| ())
            .map_err(|err| anyhow::anyhow!("Failed to send email: {err}"))
    }
}

/// Logs messages instead of sending them, for running without Mailgun.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, outgoing: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %outgoing.to_address,
            subject = %outgoing.subject,
            "Mailgun is not configured, skipping email"
        );
        tracing::debug!(body = %outgoing.html);

        Ok(())
    }
}

/// Renders and delivers an email, logging rather than returning failures.
pub async fn send_email(mailer: &dyn Mailer, email: impl Email + Send) {
    let outgoing = match OutgoingEmail::render(&email) {
        Ok(outgoing) => outgoing,
        Err(error) => {
            tracing::error!("{:#}", error);
            return;
        }
    };

    let (to, subject) = (outgoing.to_address.clone(), outgoing.subject.clone());
    match mailer.deliver(outgoing).await {
        Ok(()) => tracing::info!(%to, %subject, "Email sent"),
        Err(error) => tracing::warn!(%to, %subject, "{:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::account::WelcomeEmail;
    use super::discussion::{NewCommentEmail, NewReplyEmail};
    use super::event::{EventCancelledEmail, EventConfirmationEmail, OffWaitlistEmail};
    use super::*;
    use crate::models::discussion::Comment;
    use crate::models::school::School;
    use crate::tests::mock::{mock_event, mock_user};
    use crate::util::current_time;

    fn render(email: &impl Email) -> OutgoingEmail {
        OutgoingEmail::render(email).unwrap()
    }

    #[test]
    fn welcome_email_links_to_verification() {
        let user = mock_user();
        let school = School::new("Georgia Institute of Technology", "gatech.edu");
        let url = format!("http://localhost:3000/verifyEmail/user/{}", user.id);

        let email = render(&WelcomeEmail::new(&user, &school, url.clone()));

        assert_eq!(email.to_address, user.email);
        assert_eq!(email.to_name, user.full_name());
        assert_eq!(
            email.subject,
            "Welcome to Campus Pickup at Georgia Institute of Technology!"
        );
        assert!(email.html.contains(&url));
        assert!(email.html.contains(&user.first_name));
    }

    #[test]
    fn roster_emails_name_the_event() {
        let user = mock_user();
        let event = mock_event();

        let confirmed = render(&EventConfirmationEmail::new(&user, &event));
        assert_eq!(confirmed.subject, format!("You're confirmed for {}!", event.title));
        assert!(confirmed.html.contains(&event.location));

        let promoted = render(&OffWaitlistEmail::new(&user, &event));
        assert_eq!(
            promoted.subject,
            format!("You've been taken off the waiting list for {}!", event.title)
        );

        let cancelled = render(&EventCancelledEmail::new(&user, &event));
        assert_eq!(cancelled.subject, format!("{} has been cancelled", event.title));
    }

    #[test]
    fn discussion_emails_quote_the_comment() {
        let host = mock_user();
        let commenter = mock_user();
        let event = mock_event();
        let comment = Comment::new(
            "Is anyone bringing <cones>?".to_owned(),
            commenter.id,
            uuid::Uuid::new_v4(),
            None,
            current_time(),
        );

        let email = render(&NewCommentEmail::new(&host, &commenter, &event, &comment));
        assert_eq!(email.to_address, host.email);
        assert_eq!(email.subject, format!("New comment on {}", event.title));
        assert!(email.html.contains("Is anyone bringing &lt;cones&gt;?"));

        let reply = comment.reply("Got them, see you there".to_owned(), host.id, current_time());
        let email = render(&NewReplyEmail::new(&commenter, &comment, &host, &event, &reply));
        assert_eq!(email.to_address, commenter.email);
        assert_eq!(email.subject, format!("New reply on {}", event.title));
        assert!(email.html.contains("Got them, see you there"));
    }
}
