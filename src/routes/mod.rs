//! All routes for the API.
//!
//! | route | handler |
//! |---|---|
//! | `POST /register`, `POST /login`, `POST /logout` | [auth] |
//! | `GET/POST /verifyEmail/user/:id` | [auth::verify_email] |
//! | `GET /schools`, `GET /school/:id` | [schools] |
//! | `GET/PUT /user/:id` | [users] |
//! | `GET /events[/sport/:sport, /school/:school]`, `/event[/:id]` | [events] |
//! | `PUT /event/:id/join[Waiting]`, `DELETE /event/:id/leave[Waiting]` | [roster] |
//! | `POST /discussion/:id/comment`, `POST /comments/:id/reply`, `DELETE /comment/:id` | [discussion] |

use std::future::Future;
use std::sync::Arc;

use axum::extract::Extension;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::email::Mailer;
use crate::error::PickupResult;

pub mod auth;
pub mod discussion;
pub mod events;
pub mod roster;
pub mod schools;
pub mod users;

/// Everything a handler needs, shared through an [Extension].
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            db,
            mailer,
            config: Arc::new(config),
        }
    }
}

/// Runs a lookup made only to address an email. The change that prompted
/// the email is already saved, so a failed lookup is logged and skipped.
pub async fn for_email<T>(lookup: impl Future<Output = PickupResult<Option<T>>>) -> Option<T> {
    lookup.await.unwrap_or_else(|error| {
        tracing::warn!("Skipping email after a failed lookup: {}", error);
        None
    })
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route(
            "/verifyEmail/user/:id",
            get(auth::verify_email).post(auth::verify_email),
        )
        .route("/schools", get(schools::all_schools))
        .route("/school/:id", get(schools::school))
        .route("/user/:id", get(users::profile).put(users::update_user))
        .route("/events", get(events::all_events))
        .route("/events/sport/:sport", get(events::events_for_sport))
        .route("/events/school/:school", get(events::events_for_school))
        .route("/event", post(events::create_event))
        .route(
            "/event/:id",
            get(events::event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/event/:id/join", put(roster::join))
        .route("/event/:id/joinWaiting", put(roster::join_waitlist))
        .route("/event/:id/leave", delete(roster::leave))
        .route("/event/:id/leaveWaiting", delete(roster::leave_waitlist))
        .route("/discussion/:id/comment", post(discussion::add_comment))
        .route("/comments/:id/reply", post(discussion::reply))
        .route("/comment/:id", delete(discussion::delete_comment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
