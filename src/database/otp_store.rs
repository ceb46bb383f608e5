use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime},
    Collection, Database,
};

use crate::database::connection::OTP_COLLECTION;
use crate::errors::{AppError, Result};
use crate::models::otp::{OtpPurpose, OtpRecord};

/// Persistence for OTP records, keyed by the email nested in each payload.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores a new record and returns it with its assigned id.
    async fn insert(&self, record: OtpRecord) -> Result<OtpRecord>;

    /// Removes every record for `email` + `purpose`, used or not.
    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<u64>;

    /// The unconsumed record for `email` + `purpose`, if any.
    async fn find_pending(&self, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>>;

    /// An unconsumed record for `email` + `purpose` carrying exactly `code`.
    async fn find_unused_match(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<OtpRecord>>;

    /// Replaces code and creation time in place. Fails with `OtpNotFound` once
    /// the record has been consumed.
    async fn refresh(&self, id: &ObjectId, code: &str, created_at: DateTime<Utc>) -> Result<()>;

    /// Flips `is_used` from false to true. Returns `false` when the record was
    /// already consumed, so at most one caller ever sees `true`.
    async fn mark_used(&self, id: &ObjectId) -> Result<bool>;

    /// Deletes used records and records created at or before `cutoff`.
    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone)]
pub struct MongoOtpStore {
    collection: Collection<OtpRecord>,
}

impl MongoOtpStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(OTP_COLLECTION),
        }
    }
}

#[async_trait]
impl OtpStore for MongoOtpStore {
    async fn insert(&self, mut record: OtpRecord) -> Result<OtpRecord> {
        let result = self.collection.insert_one(&record).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::internal_server_error("OTP insert returned no ObjectId"))?;
        record.id = Some(id);
        Ok(record)
    }

    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<u64> {
        let filter = doc! { "payload.email": email, "purpose": purpose.as_str() };
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn find_pending(&self, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>> {
        let filter = doc! {
            "payload.email": email,
            "purpose": purpose.as_str(),
            "is_used": false,
        };
        Ok(self
            .collection
            .find_one(filter)
            .sort(doc! { "created_at": -1 })
            .await?)
    }

    async fn find_unused_match(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<OtpRecord>> {
        let filter = doc! {
            "payload.email": email,
            "purpose": purpose.as_str(),
            "code": code,
            "is_used": false,
        };
        Ok(self.collection.find_one(filter).await?)
    }

    async fn refresh(&self, id: &ObjectId, code: &str, created_at: DateTime<Utc>) -> Result<()> {
        // A record consumed since it was looked up must not get a new code.
        let filter = doc! { "_id": *id, "is_used": false };
        let update = doc! {
            "$set": {
                "code": code,
                "created_at": BsonDateTime::from_chrono(created_at),
            }
        };
        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(AppError::OtpNotFound);
        }
        Ok(())
    }

    async fn mark_used(&self, id: &ObjectId) -> Result<bool> {
        // The is_used guard in the filter makes this a compare-and-set.
        let filter = doc! { "_id": *id, "is_used": false };
        let update = doc! { "$set": { "is_used": true } };
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count == 1)
    }

    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let filter = doc! {
            "$or": [
                { "is_used": true },
                { "created_at": { "$lte": BsonDateTime::from_chrono(cutoff) } },
            ]
        };
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
