use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{PickupError, PickupResult};
use crate::models::discussion::DiscussionThread;
use crate::models::static_data::{SkillLevel, Sport};
use crate::util::{non_blank, parse_event_date};

pub const MIN_PLAYERS: i32 = 2;
pub const MAX_PLAYERS: i32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// When the game starts
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub sport: String,
    pub skill_level: String,
    /// Where the game will be played
    pub location: String,
    /// Whether the game is open to all genders
    pub coed: bool,
    pub max_players: i32,
    pub host_id: Uuid,
    pub school_id: Uuid,
    /// The roster, in the order players joined
    pub users_joined_ids: Vec<Uuid>,
    /// The waitlist, in the order players will be promoted
    pub users_waiting_ids: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Which events to list.
#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    All,
    Sport(String),
    School(Uuid),
    HostedBy(Uuid),
    JoinedBy(Uuid),
    WaitingFor(Uuid),
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Sport(sport) => &event.sport == sport,
            EventFilter::School(school) => &event.school_id == school,
            EventFilter::HostedBy(user) => &event.host_id == user,
            EventFilter::JoinedBy(user) => event.users_joined_ids.contains(user),
            EventFilter::WaitingFor(user) => event.users_waiting_ids.contains(user),
        }
    }
}

/// A single change to an event's roster, made on behalf of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Join(Uuid),
    JoinWaitlist(Uuid),
    Leave(Uuid),
    LeaveWaitlist(Uuid),
}

/// The event after a roster change, plus anyone moved off the waitlist.
#[derive(Debug, Clone)]
pub struct RosterUpdate {
    pub event: Event,
    pub promoted: Vec<Uuid>,
}

impl Event {
    pub async fn with_id(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        db.event_with_id(id)
            .await?
            .ok_or_else(|| PickupError::not_found("Event not found."))
    }

    pub fn is_full(&self) -> bool {
        self.users_joined_ids.len() >= self.max_players as usize
    }

    pub fn open_spots(&self) -> usize {
        (self.max_players as usize).saturating_sub(self.users_joined_ids.len())
    }

    pub fn ensure_hosted_by(&self, user: Uuid) -> PickupResult<()> {
        if self.host_id == user {
            Ok(())
        } else {
            Err(PickupError::forbidden("You are not the host of this event."))
        }
    }

    /// Applies a roster change, returning whoever was promoted off the
    /// waitlist as a result. The event is untouched when the change fails.
    pub fn apply_roster_change(&mut self, change: RosterChange) -> PickupResult<Vec<Uuid>> {
        match change {
            RosterChange::Join(user) => {
                if self.users_joined_ids.contains(&user) {
                    return Err(PickupError::bad_request(
                        "You have already joined this event.",
                    ));
                }
                if self.is_full() {
                    return Err(PickupError::bad_request("Event is full."));
                }

                self.users_waiting_ids.retain(|id| id != &user);
                self.users_joined_ids.push(user);
                Ok(Vec::new())
            }
            RosterChange::JoinWaitlist(user) => {
                if self.users_joined_ids.contains(&user) {
                    return Err(PickupError::bad_request(
                        "You have already joined this event.",
                    ));
                }
                if self.users_waiting_ids.contains(&user) {
                    return Err(PickupError::bad_request(
                        "You are already on the waiting list.",
                    ));
                }

                self.users_waiting_ids.push(user);
                Ok(Vec::new())
            }
            RosterChange::Leave(user) => {
                if !self.users_joined_ids.contains(&user) {
                    return Err(PickupError::bad_request("You have not joined this event."));
                }

                self.users_joined_ids.retain(|id| id != &user);
                Ok(self.promote_from_waitlist(1))
            }
            RosterChange::LeaveWaitlist(user) => {
                if !self.users_waiting_ids.contains(&user) {
                    return Err(PickupError::bad_request("You are not on the waiting list."));
                }

                self.users_waiting_ids.retain(|id| id != &user);
                Ok(Vec::new())
            }
        }
    }

    /// Moves up to `limit` waitlisted users, in order, into open spots.
    fn promote_from_waitlist(&mut self, limit: usize) -> Vec<Uuid> {
        let count = limit
            .min(self.open_spots())
            .min(self.users_waiting_ids.len());
        let promoted: Vec<Uuid> = self.users_waiting_ids.drain(..count).collect();
        self.users_joined_ids.extend(promoted.iter().copied());

        promoted
    }

    /// Applies validated changes from the host. Shrinking below the current
    /// roster is rejected; growing promotes from the waitlist into the new
    /// slots only.
    pub fn apply_changes(&mut self, changes: EventChanges) -> PickupResult<Vec<Uuid>> {
        if let Some(max_players) = changes.max_players {
            if (max_players as usize) < self.users_joined_ids.len() {
                return Err(PickupError::bad_request(
                    "Max players cannot be less than the number of players joined.",
                ));
            }
        }

        let EventChanges {
            title,
            description,
            date,
            sport,
            skill_level,
            location,
            coed,
            max_players,
        } = changes;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(sport) = sport {
            self.sport = sport;
        }
        if let Some(skill_level) = skill_level {
            self.skill_level = skill_level;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(coed) = coed {
            self.coed = coed;
        }
        let added_slots = match max_players {
            Some(max_players) => {
                let added = (max_players - self.max_players).max(0) as usize;
                self.max_players = max_players;
                added
            }
            None => 0,
        };

        Ok(self.promote_from_waitlist(added_slots))
    }
}

/// An event along with its discussion thread.
#[derive(Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub discussion: Option<DiscussionThread>,
}

impl EventDetail {
    pub async fn load(id: Uuid, db: &dyn Database) -> PickupResult<Self> {
        let event = Event::with_id(id, db).await?;
        let discussion = match db.discussion_for_event(id).await? {
            Some(discussion) => {
                let comments = db.comments_in_discussion(discussion.id).await?;
                Some(DiscussionThread::new(discussion, comments))
            }
            None => None,
        };

        Ok(Self { event, discussion })
    }
}

fn check_length(value: &str, min: usize, max: usize, message: &str) -> PickupResult<()> {
    let length = value.chars().count();
    if length < min || length > max {
        Err(PickupError::bad_request(message))
    } else {
        Ok(())
    }
}

fn check_title(title: &str) -> PickupResult<()> {
    check_length(title, 4, 50, "Title must be between 4 and 50 characters.")
}

fn check_description(description: &str) -> PickupResult<()> {
    check_length(
        description,
        10,
        500,
        "Description must be between 10 and 500 characters.",
    )
}

fn check_location(location: &str) -> PickupResult<()> {
    check_length(
        location,
        2,
        50,
        "Location must be between 2 and 50 characters.",
    )
}

fn check_date(date: &str, now: OffsetDateTime) -> PickupResult<OffsetDateTime> {
    let date =
        parse_event_date(date).ok_or_else(|| PickupError::bad_request("Invalid date format."))?;
    if date < now {
        return Err(PickupError::bad_request("Date must be in the future."));
    }

    Ok(date)
}

fn check_sport(sport: &str) -> PickupResult<()> {
    if Sport::is_valid(sport) {
        Ok(())
    } else {
        Err(PickupError::bad_request("Invalid sport."))
    }
}

fn check_skill_level(skill_level: &str) -> PickupResult<()> {
    if SkillLevel::is_valid(skill_level) {
        Ok(())
    } else {
        Err(PickupError::bad_request("Invalid skill level."))
    }
}

fn check_coed(coed: &Value) -> PickupResult<bool> {
    coed.as_bool()
        .ok_or_else(|| PickupError::bad_request("Invalid coed setting."))
}

/// Player limits arrive as raw JSON so that a string or a fraction gets the
/// same message as an out of range number.
fn players_in_range(max_players: &Value) -> Option<i32> {
    max_players
        .as_i64()
        .filter(|count| (MIN_PLAYERS as i64..=MAX_PLAYERS as i64).contains(count))
        .map(|count| count as i32)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub sport: Option<String>,
    pub skill_level: Option<String>,
    pub location: Option<String>,
    pub coed: Option<Value>,
    pub max_players: Option<Value>,
}

/// The row written for a new event, before the host's school is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: OffsetDateTime,
    pub sport: String,
    pub skill_level: String,
    pub location: String,
    pub coed: bool,
    pub max_players: i32,
}

impl NewEventForm {
    pub fn validate(&self, now: OffsetDateTime) -> PickupResult<NewEvent> {
        let (title, description, date, sport, skill_level, location, coed) = match (
            non_blank(&self.title),
            non_blank(&self.description),
            non_blank(&self.date),
            non_blank(&self.sport),
            non_blank(&self.skill_level),
            non_blank(&self.location),
            self.coed.as_ref(),
        ) {
            (
                Some(title),
                Some(description),
                Some(date),
                Some(sport),
                Some(skill_level),
                Some(location),
                Some(coed),
            ) => (title, description, date, sport, skill_level, location, coed),
            _ => return Err(PickupError::bad_request("Missing required fields.")),
        };

        check_title(title)?;
        check_description(description)?;
        let date = check_date(date, now)?;
        check_sport(sport)?;
        check_skill_level(skill_level)?;
        let coed = check_coed(coed)?;
        let max_players = self
            .max_players
            .as_ref()
            .and_then(players_in_range)
            .ok_or_else(|| PickupError::bad_request("Invalid max players."))?;

        check_location(location)?;

        Ok(NewEvent {
            title: title.to_owned(),
            description: description.to_owned(),
            date,
            sport: sport.to_owned(),
            skill_level: skill_level.to_owned(),
            location: location.to_owned(),
            coed,
            max_players,
        })
    }
}

impl NewEvent {
    /// Builds the stored event. The host is always the first player.
    pub fn into_event(self, host: Uuid, school: Uuid, now: OffsetDateTime) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            date: self.date,
            sport: self.sport,
            skill_level: self.skill_level,
            location: self.location,
            coed: self.coed,
            max_players: self.max_players,
            host_id: host,
            school_id: school,
            users_joined_ids: vec![host],
            users_waiting_ids: Vec::new(),
            created_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdateForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub sport: Option<String>,
    pub skill_level: Option<String>,
    pub location: Option<String>,
    pub coed: Option<Value>,
    pub max_players: Option<Value>,
}

/// Validated event changes; `None` leaves a field untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<OffsetDateTime>,
    pub sport: Option<String>,
    pub skill_level: Option<String>,
    pub location: Option<String>,
    pub coed: Option<bool>,
    pub max_players: Option<i32>,
}

impl EventUpdateForm {
    pub fn validate(&self, now: OffsetDateTime) -> PickupResult<EventChanges> {
        let mut changes = EventChanges::default();

        if let Some(title) = non_blank(&self.title) {
            check_title(title)?;
            changes.title = Some(title.to_owned());
        }
        if let Some(description) = non_blank(&self.description) {
            check_description(description)?;
            changes.description = Some(description.to_owned());
        }
        if let Some(date) = non_blank(&self.date) {
            changes.date = Some(check_date(date, now)?);
        }
        if let Some(sport) = non_blank(&self.sport) {
            check_sport(sport)?;
            changes.sport = Some(sport.to_owned());
        }
        if let Some(skill_level) = non_blank(&self.skill_level) {
            check_skill_level(skill_level)?;
            changes.skill_level = Some(skill_level.to_owned());
        }
        if let Some(location) = non_blank(&self.location) {
            check_location(location)?;
            changes.location = Some(location.to_owned());
        }
        if let Some(coed) = &self.coed {
            changes.coed = Some(check_coed(coed)?);
        }
        if let Some(max_players) = &self.max_players {
            let max_players = players_in_range(max_players).ok_or_else(|| {
                PickupError::bad_request("Max players must be a number between 2 and 50.")
            })?;
            changes.max_players = Some(max_players);
        }

        Ok(changes)
    }
}
