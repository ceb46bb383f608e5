// src/models/chat.rs
use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub message: String,
    pub response: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(user_id: String, message: String, response: String) -> Self {
        Self {
            id: None,
            user_id,
            message,
            response,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatHistoryEntry {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

impl From<ChatMessage> for ChatHistoryEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            message: message.message,
            response: message.response,
            timestamp: message.timestamp.format("%b %d, %Y %I:%M %p").to_string(),
        }
    }
}
