use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use fitroom_core::Error;

/// Error half of every handler. Request errors are echoed; anything else is logged and masked.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) | Error::AvatarNotFound(_) => StatusCode::NOT_FOUND,
            Error::MissingGarments(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self.0 {
            Error::MissingGarments(ids) => json!({
                "ok": false,
                "error": "Some garments do not exist",
                "missingGarmentIds": ids,
            }),
            Error::Unauthorized(_) => json!({ "ok": false, "error": "Unauthorized" }),
            err if err.is_request_error() => json!({ "ok": false, "error": err.to_string() }),
            err => {
                error!(error = %err, "request failed");
                json!({ "ok": false, "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
