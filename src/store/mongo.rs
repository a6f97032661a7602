//! MongoDB document store (cargo feature `mongodb`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{ContactMessage, MessageId, NewContactMessage};
use crate::store::MessageStore;

const COLLECTION: &str = "messages";

/// Document layout, compatible with the earlier Mongoose model.
#[derive(Debug, Serialize, Deserialize)]
struct MessageDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    message: String,
    created_at: bson::DateTime,
}

impl MessageDocument {
    fn into_message(self) -> ContactMessage {
        ContactMessage {
            id: MessageId::Object(self.id.to_hex()),
            name: self.name,
            email: self.email,
            message: self.message,
            created_at: to_chrono(self.created_at),
        }
    }
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Message store backed by a MongoDB collection.
pub struct MongoStore {
    collection: Collection<MessageDocument>,
}

impl MongoStore {
    /// Connect and verify the server with a `ping` round-trip.
    ///
    /// `default_database` is used when the URI does not name one.
    pub async fn connect(uri: &str, default_database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Pool(format!("Invalid MongoDB URI: {e}")))?;

        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(default_database));

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Pool(format!("MongoDB ping failed: {e}")))?;

        info!(database = %database.name(), "Connected to MongoDB");
        Ok(Self {
            collection: database.collection(COLLECTION),
        })
    }
}

#[async_trait]
impl MessageStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn save(&self, message: &NewContactMessage) -> Result<ContactMessage, StoreError> {
        let document = MessageDocument {
            id: ObjectId::new(),
            name: message.name.clone(),
            email: message.email.clone(),
            message: message.message.clone(),
            created_at: bson::DateTime::now(),
        };

        self.collection
            .insert_one(&document)
            .await
            .map_err(|e| StoreError::Query(format!("insert_one: {e}")))?;

        debug!(id = %document.id, "Message saved to MongoDB");
        Ok(document.into_message())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ContactMessage>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await
            .map_err(|e| StoreError::Query(format!("find: {e}")))?;

        let documents: Vec<MessageDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Serialization(format!("cursor: {e}")))?;

        Ok(documents
            .into_iter()
            .map(MessageDocument::into_message)
            .collect())
    }
}
