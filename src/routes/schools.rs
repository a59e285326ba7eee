use axum::extract::{Extension, Path};
use axum::Json;

use crate::error::PickupResult;
use crate::models::school::School;
use crate::routes::AppState;
use crate::util::parse_id;

pub async fn all_schools(Extension(state): Extension<AppState>) -> PickupResult<Json<Vec<School>>> {
    Ok(Json(state.db.schools().await?))
}

pub async fn school(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> PickupResult<Json<School>> {
    let id = parse_id(&id, "School not found")?;
    Ok(Json(School::with_id(id, state.db.as_ref()).await?))
}
