use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client, Database, IndexModel,
};

use crate::config::AppConfig;
use crate::errors::Result;

pub const USERS_COLLECTION: &str = "users";
pub const OTP_COLLECTION: &str = "otps";
pub const CHAT_COLLECTION: &str = "chat_messages";

pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    // Verify database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", config.database_name);
            tracing::info!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            tracing::warn!(
                "⚠️ Database '{}' may not exist or is inaccessible: {}",
                config.database_name,
                e
            );
        }
    }

    Ok(db)
}

fn index(keys: Document, unique: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(unique).build())
        .build()
}

/// Unique usernames and emails are what turn a signup race into `DuplicateKey`.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let users = db.collection::<Document>(USERS_COLLECTION);
    users.create_index(index(doc! { "username": 1 }, true)).await?;
    users.create_index(index(doc! { "email": 1 }, true)).await?;

    let otps = db.collection::<Document>(OTP_COLLECTION);
    otps.create_index(index(doc! { "payload.email": 1, "purpose": 1 }, false)).await?;

    let chats = db.collection::<Document>(CHAT_COLLECTION);
    chats.create_index(index(doc! { "user_id": 1, "timestamp": 1 }, false)).await?;

    tracing::info!("✅ Indexes ensured");
    Ok(())
}
