use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::email::event::EventCancelledEmail;
use crate::email::send_email;
use crate::error::PickupResult;
use crate::extract::JsonBody;
use crate::models::event::{Event, EventDetail, EventFilter, EventUpdateForm, NewEventForm};
use crate::models::school::School;
use crate::routes::roster::notify_promoted;
use crate::routes::{for_email, AppState};
use crate::util::{current_time, parse_id};

pub async fn all_events(Extension(state): Extension<AppState>) -> PickupResult<Json<Vec<Event>>> {
    Ok(Json(state.db.events(EventFilter::All).await?))
}

pub async fn events_for_sport(
    Extension(state): Extension<AppState>,
    Path(sport): Path<String>,
) -> PickupResult<Json<Vec<Event>>> {
    Ok(Json(state.db.events(EventFilter::Sport(sport)).await?))
}

pub async fn events_for_school(
    Extension(state): Extension<AppState>,
    Path(school): Path<String>,
) -> PickupResult<Json<Vec<Event>>> {
    let school_id = parse_id(&school, "School not found")?;
    let school = School::with_id(school_id, state.db.as_ref()).await?;

    Ok(Json(state.db.events(EventFilter::School(school.id)).await?))
}

pub async fn event(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> PickupResult<Json<EventDetail>> {
    let id = parse_id(&id, "Event not found.")?;
    Ok(Json(EventDetail::load(id, state.db.as_ref()).await?))
}

/// Creates an event hosted by the current user at their school.
pub async fn create_event(
    Extension(state): Extension<AppState>,
    AuthUser(host): AuthUser,
    JsonBody(form): JsonBody<NewEventForm>,
) -> PickupResult<(StatusCode, Json<Value>)> {
    let now = current_time();
    let event = form.validate(now)?.into_event(host.id, host.school_id, now);
    let event = state.db.create_event(event).await?;
    tracing::info!(event = %event.id, host = %host.id, "Created event");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event successfully created.", "event": event })),
    ))
}

pub async fn update_event(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    JsonBody(form): JsonBody<EventUpdateForm>,
) -> PickupResult<Json<Value>> {
    let id = parse_id(&id, "Event not found.")?;
    Event::with_id(id, state.db.as_ref())
        .await?
        .ensure_hosted_by(user.id())?;

    let changes = form.validate(current_time())?;
    let update = state.db.update_event(id, changes).await?;
    notify_promoted(&state, &update.event, &update.promoted).await;

    Ok(Json(json!({
        "message": "Event successfully updated.",
        "event": update.event,
    })))
}

/// Deletes the event and tells everyone on the roster.
pub async fn delete_event(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> PickupResult<Json<Value>> {
    let id = parse_id(&id, "Event not found.")?;
    let event = Event::with_id(id, state.db.as_ref()).await?;
    event.ensure_hosted_by(user.id())?;

    state.db.delete_event(id).await?;
    tracing::info!(event = %event.id, "Deleted event");

    for player_id in event.users_joined_ids.iter().filter(|&&p| p != event.host_id) {
        if let Some(player) = for_email(state.db.user_with_id(*player_id)).await {
            send_email(state.mailer.as_ref(), EventCancelledEmail::new(&player, &event)).await;
        }
    }

    Ok(Json(json!({ "message": "Event successfully deleted." })))
}
