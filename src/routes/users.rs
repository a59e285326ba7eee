use axum::extract::{Extension, Path};
use axum::Json;

use crate::auth::AuthUser;
use crate::error::{PickupError, PickupResult};
use crate::extract::JsonBody;
use crate::models::user::{User, UserProfile, UserUpdateForm};
use crate::routes::AppState;
use crate::util::parse_id;

pub async fn profile(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> PickupResult<Json<UserProfile>> {
    let id = parse_id(&id, "User not found")?;
    Ok(Json(UserProfile::load(id, state.db.as_ref()).await?))
}

/// Users may only edit themselves.
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    JsonBody(form): JsonBody<UserUpdateForm>,
) -> PickupResult<Json<User>> {
    let id = parse_id(&id, "User not found")?;
    if id != user.id() {
        return Err(PickupError::forbidden(
            "You are not authorized to edit this user.",
        ));
    }

    let changes = form.into_changes(state.config.password_cost).await?;
    let updated = state
        .db
        .update_user(id, changes)
        .await?
        .ok_or_else(|| PickupError::not_found("User not found"))?;

    Ok(Json(updated))
}
