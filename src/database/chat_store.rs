use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};

use crate::database::connection::CHAT_COLLECTION;
use crate::errors::Result;
use crate::models::chat::ChatMessage;

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn insert(&self, message: ChatMessage) -> Result<ChatMessage>;
    /// Oldest first.
    async fn history_for(&self, user_id: &str) -> Result<Vec<ChatMessage>>;
    async fn delete_for_user(&self, user_id: &str) -> Result<u64>;
}

#[derive(Clone)]
pub struct MongoChatStore {
    collection: Collection<ChatMessage>,
}

impl MongoChatStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(CHAT_COLLECTION),
        }
    }
}

#[async_trait]
impl ChatStore for MongoChatStore {
    async fn insert(&self, mut message: ChatMessage) -> Result<ChatMessage> {
        let result = self.collection.insert_one(&message).await?;
        message.id = result.inserted_id.as_object_id();
        Ok(message)
    }

    async fn history_for(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "timestamp": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "user_id": user_id }).await?;
        Ok(result.deleted_count)
    }
}
