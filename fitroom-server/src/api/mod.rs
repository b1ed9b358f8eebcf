//! HTTP surface over [`OutfitService`]. Every route requires a bearer session.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::debug;

use fitroom_common::traits::auth_traits::SessionResolver;
use fitroom_core::{Error, OutfitService};

mod avatars;
mod error;
mod outfits;
mod storage;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OutfitService>,
    pub sessions: Arc<dyn SessionResolver>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/outfits", get(outfits::list_outfits).post(outfits::create_outfit))
        .route("/api/outfits/{id}", get(outfits::get_outfit))
        .route("/api/outfits/{id}/score", post(outfits::generate_score))
        .route("/api/outfits/{id}/tryon", post(outfits::generate_tryon))
        .route("/api/avatars/{id}/analyze", post(avatars::analyze_avatar))
        .route("/api/storage/object", get(storage::get_object))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Public URL of a stored object, with the key percent-encoded as a query value.
pub fn object_url(key: &str) -> String {
    format!("/api/storage/object?key={}", urlencoding::encode(key))
}

/// The user behind the request's `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("missing bearer token".into()))?;

        match state.sessions.resolve_user(token).await? {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                debug!("rejected unknown or expired session");
                Err(Error::Unauthorized("invalid session".into()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests;
