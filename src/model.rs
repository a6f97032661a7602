//! Contact message types shared by the store, notifiers and HTTP layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by a store when a message is saved.
///
/// Sequence ids come from the in-memory counter or the SQLite identity key;
/// object ids come from the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Seq(i64),
    Object(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seq(n) => write!(f, "{n}"),
            Self::Object(s) => f.write_str(s),
        }
    }
}

/// Raw contact form body as posted by the site.
///
/// Every field is optional here so that a missing field surfaces as a
/// validation error instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContactForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
        }
    }
}

/// A validated, trimmed submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A stored contact message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: MessageId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn from_new(id: MessageId, new: &NewContactMessage, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            message: new.message.clone(),
            created_at,
        }
    }
}

/// Payload handed to notification sinks.
///
/// Carries the stored id when persistence succeeded; otherwise `id` is
/// absent and `created_at` is the time the submission was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn stored(message: &ContactMessage) -> Self {
        Self {
            id: Some(message.id.clone()),
            name: message.name.clone(),
            email: message.email.clone(),
            message: message.message.clone(),
            created_at: message.created_at,
        }
    }

    pub fn unsaved(new: &NewContactMessage) -> Self {
        Self {
            id: None,
            name: new.name.clone(),
            email: new.email.clone(),
            message: new.message.clone(),
            created_at: Utc::now(),
        }
    }
}
