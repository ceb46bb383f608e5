use serde::{Deserialize, Serialize};

use crate::models::chat::ChatHistoryEntry;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub history: Vec<ChatHistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}
