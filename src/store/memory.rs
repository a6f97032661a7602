//! In-memory store used when no durable database is configured.
//!
//! Contents live for the lifetime of the process only.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{ContactMessage, MessageId, NewContactMessage};
use crate::store::MessageStore;

/// Process-lifetime message list with an atomic id counter.
#[derive(Debug)]
pub struct MemoryStore {
    messages: RwLock<Vec<ContactMessage>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, message: &NewContactMessage) -> Result<ContactMessage, StoreError> {
        // Id and timestamp are assigned under the write lock so insertion
        // order always matches id order.
        let mut messages = self.messages.write().await;
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = i64::try_from(raw)
            .map_err(|_| StoreError::Serialization(format!("id {raw} out of range")))?;
        let stored = ContactMessage::from_new(MessageId::Seq(id), message, Utc::now());

        messages.push(stored.clone());
        debug!(id = id, "Message stored in memory");
        Ok(stored)
    }

    async fn list(&self, limit: usize) -> Result<Vec<ContactMessage>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().rev().take(limit).cloned().collect())
    }
}
