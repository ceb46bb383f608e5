use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime},
    error::{ErrorKind, WriteFailure},
    Collection, Database,
};

use crate::database::connection::USERS_COLLECTION;
use crate::errors::{AppError, Result};
use crate::models::user::User;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Fails with `DuplicateKey` when the username or email is taken.
    async fn insert(&self, user: User) -> Result<User>;
    /// Sets a new hash only while the stored version still equals `expected_version`,
    /// bumping the version. Returns `false` when the version has moved on.
    async fn replace_password(&self, id: &ObjectId, expected_version: i64, password_hash: &str) -> Result<bool>;
    async fn delete(&self, id: &ObjectId) -> Result<bool>;
}

#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let result = match self.collection.insert_one(&user).await {
            Ok(result) => result,
            Err(e) if is_duplicate_key(&e) => return Err(AppError::DuplicateKey),
            Err(e) => return Err(e.into()),
        };
        user._id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn replace_password(&self, id: &ObjectId, expected_version: i64, password_hash: &str) -> Result<bool> {
        let filter = doc! { "_id": *id, "password_version": expected_version };
        let update = doc! {
            "$set": {
                "password_hash": password_hash,
                "updated_at": BsonDateTime::from_chrono(Utc::now()),
            },
            "$inc": { "password_version": 1_i64 },
        };
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count == 1)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }
}
