use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fitroom_common::models::{OutfitDetail, ScoreState, TryonState};
use fitroom_core::Error;

use super::{object_url, ApiError, AppState, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutfitBody {
    pub avatar_id: String,
    pub garment_ids: Vec<String>,
    pub occasion: String,
}

/// `?avatarId=A1` or `?avatarIds=A1,A2`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub avatar_id: Option<String>,
    pub avatar_ids: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GarmentView {
    id: String,
    name: String,
    category: Option<String>,
    thumbnail_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TryonView {
    #[serde(flatten)]
    state: TryonState,
    image_url: Option<String>,
}

impl From<TryonState> for TryonView {
    fn from(state: TryonState) -> Self {
        let image_url = state.image_key.as_deref().map(object_url);
        Self { state, image_url }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutfitView {
    id: String,
    avatar_id: String,
    occasion: String,
    score: ScoreState,
    garments: Vec<GarmentView>,
    tryon: Option<TryonView>,
}

impl From<OutfitDetail> for OutfitView {
    fn from(detail: OutfitDetail) -> Self {
        Self {
            id: detail.outfit_id,
            avatar_id: detail.avatar_id,
            occasion: detail.occasion,
            score: detail.score,
            garments: detail
                .garments
                .into_iter()
                .map(|g| GarmentView {
                    thumbnail_url: object_url(&g.image_key),
                    id: g.garment_id,
                    name: g.name,
                    category: g.category,
                })
                .collect(),
            tryon: detail.tryon.map(TryonView::from),
        }
    }
}

pub async fn create_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateOutfitBody>,
) -> Result<Json<Value>, ApiError> {
    let created = state
        .service
        .create_outfit(&user_id, &body.avatar_id, &body.garment_ids, &body.occasion)
        .await?;
    Ok(Json(json!({ "ok": true, "id": created.outfit_id, "cached": created.cached })))
}

pub async fn list_outfits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(ids) = query.avatar_ids.as_deref() {
        let ids: Vec<String> = ids.split(',').map(str::to_string).collect();
        let groups = state.service.list_outfits_by_avatars(&user_id, &ids).await?;
        return Ok(Json(json!({ "ok": true, "groups": groups })));
    }

    let avatar_id = query
        .avatar_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("avatarId or avatarIds is required".into()))?;
    let outfits = state.service.list_outfits(&user_id, avatar_id.trim()).await?;
    Ok(Json(json!({ "ok": true, "outfits": outfits })))
}

pub async fn get_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(outfit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let detail = state.service.get_outfit(&user_id, &outfit_id).await?;
    Ok(Json(json!({ "ok": true, "outfit": OutfitView::from(detail) })))
}

pub async fn generate_score(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(outfit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let score = state.service.generate_score(&user_id, &outfit_id).await?;
    Ok(Json(json!({
        "ok": true,
        "id": outfit_id,
        "score": score,
    })))
}

pub async fn generate_tryon(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(outfit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tryon = state.service.generate_tryon(&user_id, &outfit_id).await?;
    Ok(Json(json!({
        "ok": true,
        "tryon": TryonView::from(tryon),
    })))
}
