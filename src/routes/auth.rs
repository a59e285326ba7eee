//! Registration, login and email verification.

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{hash_password, verify_password, BearerToken};
use crate::email::account::WelcomeEmail;
use crate::email::send_email;
use crate::error::{PickupError, PickupResult};
use crate::extract::JsonBody;
use crate::models::session::Session;
use crate::models::user::{LoginForm, NewUser, RegisterForm, User};
use crate::routes::AppState;
use crate::util::{current_time, parse_id};

pub async fn register(
    Extension(state): Extension<AppState>,
    JsonBody(form): JsonBody<RegisterForm>,
) -> PickupResult<(StatusCode, Json<Value>)> {
    let registration = form.validate()?;

    if state.db.user_with_email(&registration.email).await?.is_some() {
        return Err(PickupError::bad_request(
            "Account with email address already exists.",
        ));
    }
    let school = state
        .db
        .school_with_email_domain(&registration.email_domain)
        .await?
        .ok_or_else(|| PickupError::bad_request("Invalid university email."))?;

    let new_user = NewUser {
        password_hash: hash_password(&registration.password, state.config.password_cost).await?,
        email: registration.email,
        first_name: registration.first_name,
        last_name: registration.last_name,
        school_id: school.id,
    };
    let user = state.db.create_user(new_user, current_time()).await?;
    let token =
        Session::generate(user.id, state.config.session_lifetime, state.db.as_ref()).await?;
    tracing::info!(user = %user.id, school = %school.name, "Registered new user");

    let verify_url = state
        .config
        .verify_url(user.id, user.verification_token.as_deref().unwrap_or_default());
    send_email(
        state.mailer.as_ref(),
        WelcomeEmail::new(&user, &school, verify_url),
    )
    .await;

    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    JsonBody(form): JsonBody<LoginForm>,
) -> PickupResult<Json<Value>> {
    let invalid = || PickupError::unauthorized("Invalid email or password.");
    let (email, password) = match (form.email.as_deref(), form.password.as_deref()) {
        (Some(email), Some(password)) => (email.trim(), password),
        _ => return Err(invalid()),
    };

    let user = state.db.user_with_email(email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash).await? {
        return Err(invalid());
    }

    let token =
        Session::generate(user.id, state.config.session_lifetime, state.db.as_ref()).await?;

    Ok(Json(json!({ "token": token, "user": user })))
}

pub async fn logout(
    Extension(state): Extension<AppState>,
    BearerToken(token): BearerToken,
) -> PickupResult<Json<Value>> {
    Session::remove(&token, state.db.as_ref()).await?;

    Ok(Json(json!({ "message": "Successfully logged out." })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

pub async fn verify_email(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> PickupResult<Json<User>> {
    let id = parse_id(&id, "User not found")?;
    let token = query.token.unwrap_or_default();

    match state.db.mark_email_verified(id, &token).await? {
        Some(user) => {
            tracing::info!(user = %user.id, "Verified student email");
            Ok(Json(user))
        }
        None => {
            User::with_id(id, state.db.as_ref()).await?;
            Err(PickupError::bad_request("Invalid verification link."))
        }
    }
}
