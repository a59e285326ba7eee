use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::Database;
use crate::error::{PickupError, PickupResult};
use crate::models::discussion::Comment;
use crate::models::event::{Event, EventFilter};
use crate::models::school::School;
use crate::models::static_data::{SchoolYear, Sport};
use crate::util::{email_domain, non_blank};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// The user's school email, which must be unique
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// A short biography written by the user
    pub bio: Option<String>,
    /// The user's academic major
    pub major: Option<String>,
    pub favorite_sports: Vec<String>,
    pub school_year: Option<String>,
    /// A link to a profile picture
    pub profile_image: Option<String>,
    /// A link to a profile banner image
    pub cover_image: Option<String>,
    /// Whether the user has followed the link in their welcome email
    pub email_verified: bool,
    /// The secret carried by the welcome email's verification link
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    /// Whether to email the user when they are confirmed for an event
    pub event_confirmation_notification: bool,
    /// Whether to email the user when someone replies to their comment
    pub discussion_reply_notification: bool,
    pub school_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn with_id(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        db.user_with_id(id)
            .await?
            .ok_or_else(|| PickupError::not_found("User not found"))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Applies a validated set of profile changes.
    pub fn apply(&mut self, changes: UserChanges) {
        let UserChanges {
            first_name,
            last_name,
            bio,
            major,
            favorite_sports,
            school_year,
            profile_image,
            cover_image,
            password_hash,
            event_confirmation_notification,
            discussion_reply_notification,
        } = changes;

        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        if major.is_some() {
            self.major = major;
        }
        if let Some(favorite_sports) = favorite_sports {
            self.favorite_sports = favorite_sports;
        }
        if school_year.is_some() {
            self.school_year = school_year;
        }
        if profile_image.is_some() {
            self.profile_image = profile_image;
        }
        if cover_image.is_some() {
            self.cover_image = cover_image;
        }
        if let Some(password_hash) = password_hash {
            self.password_hash = password_hash;
        }
        if let Some(enabled) = event_confirmation_notification {
            self.event_confirmation_notification = enabled;
        }
        if let Some(enabled) = discussion_reply_notification {
            self.discussion_reply_notification = enabled;
        }
    }
}

/// Everything shown on a user's profile page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub school: Option<School>,
    pub events_hosted: Vec<Event>,
    pub events_joined: Vec<Event>,
    pub events_waiting: Vec<Event>,
    pub comments: Vec<Comment>,
}

impl UserProfile {
    pub async fn load(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        let user = User::with_id(id, db).await?;

        Ok(Self {
            school: db.school_with_id(user.school_id).await?,
            events_hosted: db.events(EventFilter::HostedBy(id)).await?,
            events_joined: db.events(EventFilter::JoinedBy(id)).await?,
            events_waiting: db.events(EventFilter::WaitingFor(id)).await?,
            comments: db.comments_by_user(id).await?,
            user,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A registration that passed every check that doesn't need the database.
#[derive(Debug, PartialEq)]
pub struct Registration {
    pub email: String,
    pub email_domain: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> PickupResult<Registration> {
        let (email, password) = match (non_blank(&self.email), self.password.as_deref()) {
            (Some(email), Some(password)) if !password.is_empty() => (email, password),
            _ => return Err(PickupError::bad_request("Email and password are required.")),
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PickupError::bad_request(
                "Password must be at least 8 characters long.",
            ));
        }

        let (first_name, last_name) =
            match (non_blank(&self.first_name), non_blank(&self.last_name)) {
            (Some(first_name), Some(last_name)) => (first_name, last_name),
            _ => {
                return Err(PickupError::bad_request(
                    "First name and last name are required.",
                ))
            }
        };

        let email_domain =
            email_domain(email).ok_or_else(|| PickupError::bad_request("Invalid email address."))?;

        Ok(Registration {
            email: email.to_ascii_lowercase(),
            email_domain,
            password: password.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        })
    }
}

/// The row written for a freshly registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub school_id: Uuid,
}

impl NewUser {
    pub fn into_user(self, now: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: None,
            major: None,
            favorite_sports: Vec::new(),
            school_year: None,
            profile_image: None,
            cover_image: None,
            email_verified: false,
            verification_token: Some(Uuid::new_v4().simple().to_string()),
            event_confirmation_notification: true,
            discussion_reply_notification: true,
            school_id: self.school_id,
            created_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub major: Option<String>,
    pub favorite_sports: Option<Vec<String>>,
    pub school_year: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub new_password: Option<String>,
    pub event_confirmation_notification: Option<bool>,
    pub discussion_reply_notification: Option<bool>,
}

/// Validated profile changes; `None` leaves a field untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub major: Option<String>,
    pub favorite_sports: Option<Vec<String>>,
    pub school_year: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub password_hash: Option<String>,
    pub event_confirmation_notification: Option<bool>,
    pub discussion_reply_notification: Option<bool>,
}

impl UserUpdateForm {
    /// Validates every field, then hashes the new password if there is one.
    pub async fn into_changes(self, password_cost: u32) -> PickupResult<UserChanges> {
        let owned = |value: &Option<String>| non_blank(value).map(str::to_owned);

        let favorite_sports = match &self.favorite_sports {
            Some(sports) => {
                let mut unique = Vec::with_capacity(sports.len());
                for sport in sports {
                    if !Sport::is_valid(sport) {
                        return Err(PickupError::bad_request("Invalid sport."));
                    }
                    if !unique.contains(sport) {
                        unique.push(sport.clone());
                    }
                }
                Some(unique)
            }
            None => None,
        };

        let school_year = owned(&self.school_year);
        if let Some(year) = &school_year {
            if !SchoolYear::is_valid(year) {
                return Err(PickupError::bad_request("Invalid school year."));
            }
        }

        let new_password = self.new_password.as_deref().filter(|pass| !pass.is_empty());
        if let Some(password) = new_password {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(PickupError::bad_request(
                    "Password must be at least 8 characters long.",
                ));
            }
        }

        let password_hash = match new_password {
            Some(password) => Some(hash_password(password, password_cost).await?),
            None => None,
        };

        Ok(UserChanges {
            first_name: owned(&self.first_name),
            last_name: owned(&self.last_name),
            bio: owned(&self.bio),
            major: owned(&self.major),
            favorite_sports,
            school_year,
            profile_image: owned(&self.profile_image),
            cover_image: owned(&self.cover_image),
            password_hash,
            event_confirmation_notification: self.event_confirmation_notification,
            discussion_reply_notification: self.discussion_reply_notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mock::mock_user;

    fn registration() -> RegisterForm {
        RegisterForm {
            email: Some("Buzz@GaTech.edu".to_owned()),
            password: Some("yellowjackets".to_owned()),
            first_name: Some("Buzz".to_owned()),
            last_name: Some("Bee".to_owned()),
        }
    }

    #[test]
    fn valid_registration_normalizes_email() {
        let valid = registration().validate().unwrap();
        assert_eq!(valid.email, "buzz@gatech.edu");
        assert_eq!(valid.email_domain, "gatech.edu");
    }

    #[test]
    fn registration_checks_run_in_order() {
        let form = RegisterForm {
            password: None,
            ..registration()
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Email and password are required."
        );

        let form = RegisterForm {
            password: Some("short".to_owned()),
            first_name: None,
            ..registration()
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Password must be at least 8 characters long."
        );

        let form = RegisterForm {
            last_name: Some(" ".to_owned()),
            ..registration()
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "First name and last name are required."
        );

        let form = RegisterForm {
            email: Some("buzz-at-gatech".to_owned()),
            ..registration()
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Invalid email address."
        );
    }

    #[tokio::test]
    async fn updates_reject_unknown_sports_and_years() {
        let form = UserUpdateForm {
            favorite_sports: Some(vec!["Soccer".to_owned(), "Quidditch".to_owned()]),
            ..Default::default()
        };
        assert_eq!(
            form.into_changes(4).await.unwrap_err().to_string(),
            "Invalid sport."
        );

        let form = UserUpdateForm {
            school_year: Some("Super Senior".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            form.into_changes(4).await.unwrap_err().to_string(),
            "Invalid school year."
        );

        let form = UserUpdateForm {
            new_password: Some("short".to_owned()),
            ..Default::default()
        };
        assert!(form.into_changes(4).await.is_err());
    }

    #[tokio::test]
    async fn updates_only_touch_provided_fields() {
        let mut user = mock_user();
        let before = user.clone();
        let changes = UserUpdateForm {
            bio: Some("Left back, right foot.".to_owned()),
            favorite_sports: Some(vec![
                "Soccer".to_owned(),
                "Tennis".to_owned(),
                "Soccer".to_owned(),
            ]),
            first_name: Some(String::new()),
            discussion_reply_notification: Some(false),
            ..Default::default()
        }
        .into_changes(4)
        .await
        .unwrap();

        user.apply(changes);

        assert_eq!(user.bio.as_deref(), Some("Left back, right foot."));
        assert_eq!(user.favorite_sports, vec!["Soccer", "Tennis"]);
        assert_eq!(user.first_name, before.first_name);
        assert!(!user.discussion_reply_notification);
        assert!(user.event_confirmation_notification);
        assert_eq!(user.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn new_passwords_are_hashed() {
        let changes = UserUpdateForm {
            new_password: Some("a much longer password".to_owned()),
            ..Default::default()
        }
        .into_changes(4)
        .await
        .unwrap();

        let hash = changes.password_hash.unwrap();
        assert!(bcrypt::verify("a much longer password", &hash).unwrap());
    }
}
