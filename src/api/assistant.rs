//! Reading assistant endpoint

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::assistant::{ChatReply, ChatRequest},
};

use super::AuthenticatedUser;

/// Ask the reading assistant for recommendations from the books on the shelf
#[utoipa::path(
    post,
    path = "/assistant/chat",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Invalid conversation"),
        (status = 429, description = "Too many requests"),
        (status = 502, description = "Provider failure"),
        (status = 503, description = "Assistant not configured")
    )
)]
pub async fn chat(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    claims.require_member()?;
    request.validate()?;

    let reply = state.services.assistant.chat(&request.messages).await?;
    Ok(Json(reply))
}
