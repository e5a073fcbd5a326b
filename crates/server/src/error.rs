//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medphase_core::{Error, ErrorCode};
use medphase_image::ImageError;
use serde::Serialize;

/// An error on its way out as an HTTP response.
///
/// Rendered as `{"detail": "...", "code": "E####"}` with the status taken
/// from the error code.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    code: String,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Underlying error code
    pub fn code(&self) -> ErrorCode {
        self.0.code
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        Self(err.into())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: &self.0.message,
            code: self.0.code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
