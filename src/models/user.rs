use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Bumped on every password change; reset tokens are bound to it.
    #[serde(default)]
    pub password_version: i64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            _id: None,
            username,
            email,
            password_hash,
            password_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_hex(&self) -> Option<String> {
        self._id.map(|id| id.to_hex())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
    pub token: String,
}

/// Session claims carried by the bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResetClaims {
    pub user_id: String,
    pub email: String,
    pub password_version: i64,
    pub purpose: String,
    pub exp: usize,
}
