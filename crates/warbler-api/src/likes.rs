use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;

use warbler_db::LikeOutcome;
use warbler_types::api::{Claims, LikeResponse};

use crate::auth::{AppState, with_db};
use crate::error::AppError;

/// POST /api/messages/{message_id}/toggle_like
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<LikeResponse>, AppError> {
    let user_id = claims.sub;
    let outcome = with_db(&state, move |db| db.toggle_like(user_id, message_id)).await?;
    debug!("toggle_like user #{} message #{}: {:?}", user_id, message_id, outcome);

    let message = match outcome {
        LikeOutcome::Liked => "Liked",
        LikeOutcome::Unliked => "Unliked",
        LikeOutcome::NoMessage => "There is no message",
        LikeOutcome::OwnMessage => "You cannot like your own message",
    };

    Ok(Json(LikeResponse { message: message.to_string() }))
}
