use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::chat::{ChatRequest, ChatResponse},
    error::AppResult,
    response::ApiResponse,
    routes::params::JsonBody,
    services::assistant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/ask", post(ask))
}

/// The catalog read has its own deadline inside the service; the generator client carries its
/// own request timeout.
#[utoipa::path(
    post,
    path = "/api/v1/chatbot/ask",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<ChatResponse>),
        (status = 400, description = "Empty prompt"),
        (status = 500, description = "Text generator unavailable")
    ),
    tag = "Chatbot"
)]
pub async fn ask(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    let resp = assistant_service::answer(&state, payload).await?;
    Ok(Json(resp))
}
