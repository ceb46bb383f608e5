use axum::{extract::State, Extension, Json};

use crate::dtos::chat_dtos::{ChatHistoryResponse, ChatReply, ChatRequest};
use crate::errors::{AppError, Result};
use crate::models::chat::{ChatHistoryEntry, ChatMessage};
use crate::models::user::Claims;
use crate::state::AppState;

// POST /api/chat
pub async fn chatbot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::invalid_data("Message cannot be empty"));
    }

    let response = state.chatbot.reply(&payload.message).await;

    state
        .chats
        .insert(ChatMessage::new(
            claims.sub.clone(),
            payload.message,
            response.clone(),
        ))
        .await?;

    Ok(Json(ChatReply {
        success: true,
        response,
    }))
}

// GET /api/chat/history
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ChatHistoryResponse>> {
    let history = state
        .chats
        .history_for(&claims.sub)
        .await?
        .into_iter()
        .map(ChatHistoryEntry::from)
        .collect();

    Ok(Json(ChatHistoryResponse {
        success: true,
        history,
    }))
}
