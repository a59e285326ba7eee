//! Request extractors shared by the routes.

use axum::body::HttpBody;
use axum::extract::{FromRequest, RequestParts};
use axum::{BoxError, Json};
use serde::de::DeserializeOwned;

use crate::error::PickupError;

/// A JSON request body whose rejections use the API's error format.
pub struct JsonBody<T>(pub T);

#[async_trait::async_trait]
impl<T, B> FromRequest<B> for JsonBody<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = PickupError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(PickupError::bad_request(format!(
                "Invalid request body: {}",
                rejection
            ))),
        }
    }
}
