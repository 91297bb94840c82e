use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::{codes, AppError};

/// JSON body extractor whose rejections speak the error envelope: a wrong
/// or missing content type and a malformed body get distinct codes.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::bad_request(
                codes::INVALID_CONTENT_TYPE,
                "Content-Type must be application/json",
            )),
            Err(rejection) => Err(AppError::bad_request(
                codes::INVALID_JSON,
                format!("Request body is not valid JSON: {}", rejection.body_text()),
            )),
        }
    }
}
