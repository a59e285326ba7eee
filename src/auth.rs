//! Authorization handling for the API.
//!
//! The [AuthUser] struct, taken as an extractor parameter by endpoints, is
//! the primary method for handling authorization. Taking one asserts that the
//! request carries a live bearer token for a user who has verified their
//! school email.

use axum::extract::{Extension, FromRequest, RequestParts};
use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::TypedHeader;

use crate::error::{PickupError, PickupResult};
use crate::models::session::Session;
use crate::models::user::User;
use crate::routes::AppState;

// bcrypt is slow on purpose, so it runs on the blocking pool.

pub async fn hash_password(password: &str, cost: u32) -> PickupResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| PickupError::Server(format!("Password hashing task failed: {}", err)))?
        .map_err(|err| PickupError::Server(format!("Failed to hash password: {}", err)))
}

pub async fn verify_password(password: &str, hash: &str) -> PickupResult<bool> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| PickupError::Server(format!("Password check task failed: {}", err)))?
        .map_err(|err| PickupError::Server(format!("Failed to verify password: {}", err)))
}

/// The raw bearer token sent with a request.
pub struct BearerToken(pub String);

#[async_trait::async_trait]
impl<B: Send> FromRequest<B> for BearerToken {
    type Rejection = PickupError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request(req)
                .await
                .map_err(|_| PickupError::unauthorized("Unauthorized Access"))?;

        Ok(Self(bearer.token().to_owned()))
    }
}

/// A logged-in user with a verified school email.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

#[async_trait::async_trait]
impl<B: Send> FromRequest<B> for AuthUser {
    type Rejection = PickupError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<AppState>::from_request(req)
            .await
            .map_err(|err| PickupError::Server(format!("App state is missing: {}", err)))?;
        let BearerToken(token) = BearerToken::from_request(req).await?;

        let user_id = Session::user_for_token(&token, state.db.as_ref())
            .await?
            .ok_or_else(|| PickupError::unauthorized("Unauthorized Access"))?;
        let user = state
            .db
            .user_with_id(user_id)
            .await?
            .ok_or_else(|| PickupError::unauthorized("Unauthorized Access"))?;

        if !user.email_verified {
            return Err(PickupError::unauthorized("Must validate student email."));
        }

        Ok(Self(user))
    }
}
