use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use fitroom_core::imaging::sniff_mime;

use super::{ApiError, AppState, AuthUser};

#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    pub key: String,
}

/// Streams back a stored image owned by the caller. Objects are immutable once written.
pub async fn get_object(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ObjectQuery>,
) -> Result<Response, ApiError> {
    let bytes = state.service.read_object(&user_id, &query.key).await?;
    let mime = sniff_mime(&bytes);
    Ok((
        [(CONTENT_TYPE, mime), (CACHE_CONTROL, "private, max-age=31536000, immutable")],
        bytes,
    )
        .into_response())
}
