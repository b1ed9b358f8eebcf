use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use fitroom_core::AvatarAnalysisOutcome;

use super::{ApiError, AppState, AuthUser};

/// 200 with the profile, 422 when the model rejects the photo, 502 when the model call fails.
pub async fn analyze_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(avatar_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let outcome = state.service.analyze_avatar(&user_id, &avatar_id).await?;
    let (status, body) = match outcome {
        AvatarAnalysisOutcome::Analyzed { profile } => {
            (StatusCode::OK, json!({ "success": true, "data": profile }))
        }
        AvatarAnalysisOutcome::Rejected { error } => {
            (StatusCode::UNPROCESSABLE_ENTITY, json!({ "success": false, "error": error }))
        }
        AvatarAnalysisOutcome::Failed { error_code, error_message } => (
            StatusCode::BAD_GATEWAY,
            json!({ "success": false, "error": { "code": error_code, "message": error_message } }),
        ),
    };
    Ok((status, Json(body)))
}
