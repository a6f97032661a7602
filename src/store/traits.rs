//! `MessageStore` trait — the persistence capability used by the handler.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{ContactMessage, NewContactMessage};

/// Backend-agnostic, append-only message store.
///
/// Implementations are built once at startup and shared behind an `Arc`;
/// calls consult the existing connection state and never reconnect.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Append a message. Returns it with the store-assigned id and timestamp.
    async fn save(&self, message: &NewContactMessage) -> Result<ContactMessage, StoreError>;

    /// Most recent messages first, at most `limit`.
    async fn list(&self, limit: usize) -> Result<Vec<ContactMessage>, StoreError>;
}
