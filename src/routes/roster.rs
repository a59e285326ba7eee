//! Joining and leaving events and their waitlists.
//!
//! Every change goes through [Database::change_roster](crate::db::Database::change_roster),
//! which holds the event's lock for the whole read-check-write.

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::email::event::{EventConfirmationEmail, OffWaitlistEmail};
use crate::email::send_email;
use crate::error::PickupResult;
use crate::models::event::{Event, RosterChange};
use crate::routes::{for_email, AppState};
use crate::util::parse_id;

/// Emails everyone who was just moved off the waitlist.
pub async fn notify_promoted(state: &AppState, event: &Event, promoted: &[Uuid]) {
    for user_id in promoted {
        tracing::info!(event = %event.id, user = %user_id, "Promoted off the waitlist");
        if let Some(user) = for_email(state.db.user_with_id(*user_id)).await {
            send_email(state.mailer.as_ref(), OffWaitlistEmail::new(&user, event)).await;
        }
    }
}

async fn change_roster(
    state: &AppState,
    id: &str,
    change: RosterChange,
    message: &str,
) -> PickupResult<(Event, Vec<Uuid>, Json<Value>)> {
    let id = parse_id(id, "Event not found.")?;
    let update = state.db.change_roster(id, change).await?;
    let body = Json(json!({ "message": message, "event": &update.event }));

    Ok((update.event, update.promoted, body))
}

pub async fn join(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
) -> PickupResult<Json<Value>> {
    let (event, _, body) = change_roster(
        &state,
        &id,
        RosterChange::Join(user.id),
        "Successfully joined event.",
    )
    .await?;

    if user.event_confirmation_notification {
        send_email(state.mailer.as_ref(), EventConfirmationEmail::new(&user, &event)).await;
    }

    Ok(body)
}

pub async fn join_waitlist(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> PickupResult<Json<Value>> {
    let (_, _, body) = change_roster(
        &state,
        &id,
        RosterChange::JoinWaitlist(user.id()),
        "Successfully joined waiting list.",
    )
    .await?;

    Ok(body)
}

pub async fn leave(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> PickupResult<Json<Value>> {
    let (event, promoted, body) = change_roster(
        &state,
        &id,
        RosterChange::Leave(user.id()),
        "Successfully left event.",
    )
    .await?;
    notify_promoted(&state, &event, &promoted).await;

    Ok(body)
}

pub async fn leave_waitlist(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> PickupResult<Json<Value>> {
    let (_, _, body) = change_roster(
        &state,
        &id,
        RosterChange::LeaveWaitlist(user.id()),
        "Successfully left waiting list.",
    )
    .await?;

    Ok(body)
}
