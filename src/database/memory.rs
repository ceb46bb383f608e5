//! In-process stores used by the unit tests in place of MongoDB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

use crate::database::chat_store::ChatStore;
use crate::database::otp_store::OtpStore;
use crate::database::user_store::UserStore;
use crate::errors::{AppError, Result};
use crate::models::chat::ChatMessage;
use crate::models::otp::{OtpPurpose, OtpRecord};
use crate::models::user::User;

#[derive(Default)]
pub struct MemoryOtpStore {
    records: Mutex<Vec<OtpRecord>>,
}

impl MemoryOtpStore {
    pub async fn records(&self) -> Vec<OtpRecord> {
        self.records.lock().await.clone()
    }
}

fn same_key(record: &OtpRecord, email: &str, purpose: OtpPurpose) -> bool {
    record.payload.email() == email && record.purpose == purpose
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn insert(&self, mut record: OtpRecord) -> Result<OtpRecord> {
        record.id = Some(ObjectId::new());
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !same_key(r, email, purpose));
        Ok((before - records.len()) as u64)
    }

    async fn find_pending(&self, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| same_key(r, email, purpose) && !r.is_used)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_unused_match(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .find(|r| same_key(r, email, purpose) && !r.is_used && r.code == code)
            .cloned())
    }

    async fn refresh(&self, id: &ObjectId, code: &str, created_at: DateTime<Utc>) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id.as_ref() == Some(id) && !r.is_used)
            .ok_or(AppError::OtpNotFound)?;
        record.code = code.to_string();
        record.created_at = created_at;
        Ok(())
    }

    async fn mark_used(&self, id: &ObjectId) -> Result<bool> {
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|r| r.id.as_ref() == Some(id)) {
            Some(record) if !record.is_used => {
                record.is_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !r.is_used && r.created_at > cutoff);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u._id.as_ref() == Some(id)).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::DuplicateKey);
        }
        user._id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn replace_password(&self, id: &ObjectId, expected_version: i64, password_hash: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users
            .iter_mut()
            .find(|u| u._id.as_ref() == Some(id) && u.password_version == expected_version)
        {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.password_version += 1;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|u| u._id.as_ref() != Some(id));
        Ok(users.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryChatStore {
    messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn insert(&self, mut message: ChatMessage) -> Result<ChatMessage> {
        message.id = Some(ObjectId::new());
        self.messages.lock().await.push(message.clone());
        Ok(message)
    }

    async fn history_for(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.lock().await;
        let mut history: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by_key(|m| m.timestamp);
        Ok(history)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|m| m.user_id != user_id);
        Ok((before - messages.len()) as u64)
    }
}
