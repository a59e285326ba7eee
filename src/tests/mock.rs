use serde_json::json;
use time::macros::datetime;
use uuid::Uuid;

use crate::models::event::{Event, NewEventForm};
use crate::models::user::{NewUser, User};

pub fn mock_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "buzz@gatech.edu".to_owned(),
        password_hash: "not a real hash".to_owned(),
        first_name: "Buzz".to_owned(),
        last_name: "Bee".to_owned(),
        bio: None,
        major: Some("Computer Science".to_owned()),
        favorite_sports: vec!["Soccer".to_owned()],
        school_year: Some("Junior".to_owned()),
        profile_image: None,
        cover_image: None,
        email_verified: true,
        verification_token: None,
        event_confirmation_notification: true,
        discussion_reply_notification: true,
        school_id: Uuid::new_v4(),
        created_at: datetime!(2029-08-20 09:00 UTC),
    }
}

pub fn mock_new_user(school_id: Uuid) -> NewUser {
    NewUser {
        email: "buzz@gatech.edu".to_owned(),
        password_hash: "not a real hash".to_owned(),
        first_name: "Buzz".to_owned(),
        last_name: "Bee".to_owned(),
        school_id,
    }
}

/// A ten-player soccer game with only its host on the roster.
pub fn mock_event() -> Event {
    let host = Uuid::new_v4();

    Event {
        id: Uuid::new_v4(),
        title: "Sunday Soccer".to_owned(),
        description: "Casual seven on seven, all welcome.".to_owned(),
        date: datetime!(2031-03-02 15:00 UTC),
        sport: "Soccer".to_owned(),
        skill_level: "Intermediate".to_owned(),
        location: "Tech Green".to_owned(),
        coed: true,
        max_players: 10,
        host_id: host,
        school_id: Uuid::new_v4(),
        users_joined_ids: vec![host],
        users_waiting_ids: Vec::new(),
        created_at: datetime!(2030-01-01 09:00 UTC),
    }
}

pub fn mock_event_form() -> NewEventForm {
    NewEventForm {
        title: Some("Sunday Soccer".to_owned()),
        description: Some("Casual seven on seven, all welcome.".to_owned()),
        date: Some("2031-03-02T15:00:00Z".to_owned()),
        sport: Some("Soccer".to_owned()),
        skill_level: Some("Intermediate".to_owned()),
        location: Some("Tech Green".to_owned()),
        coed: Some(json!(true)),
        max_players: Some(json!(10)),
    }
}
