pub mod chat;
pub mod health;
pub mod scp;

use axum::{Json, extract::rejection::JsonRejection};

use crate::error_handler::AppError;

/// A request without a JSON content type counts as an empty body, so field
/// validation decides the response. Malformed JSON is still rejected.
pub(crate) fn json_or_default<T: Default>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// `Some` only for a non-empty string.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
