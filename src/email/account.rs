use askama::Template;

use crate::email::Email;
use crate::models::school::School;
use crate::models::user::User;

/// Sent on registration with the link that verifies the school email.
#[derive(Template)]
#[template(path = "welcome.html")]
pub struct WelcomeEmail<'a> {
    pub user: &'a User,
    pub school: &'a School,
    pub verify_url: String,
}

impl<'a> WelcomeEmail<'a> {
    pub fn new(user: &'a User, school: &'a School, verify_url: String) -> Self {
        Self {
            user,
            school,
            verify_url,
        }
    }
}

impl<'a> Email for WelcomeEmail<'a> {
    fn subject(&self) -> String {
        format!("Welcome to Campus Pickup at {}!", self.school.name)
    }

    fn recipient(&self) -> &User {
        self.user
    }
}
