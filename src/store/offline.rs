//! Placeholder for a configured store that could not be reached at startup.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{ContactMessage, NewContactMessage};
use crate::store::MessageStore;

/// Store that reports every call as unavailable.
///
/// Built once at startup when the configured backend fails to open, so
/// writes degrade to "skipped" and reads to HTTP 500.
#[derive(Debug, Clone)]
pub struct OfflineStore {
    backend: &'static str,
    reason: String,
}

impl OfflineStore {
    pub fn new(backend: &'static str, reason: impl Into<String>) -> Self {
        Self {
            backend,
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> StoreError {
        StoreError::Unavailable {
            backend: self.backend.to_string(),
            reason: self.reason.clone(),
        }
    }
}

#[async_trait]
impl MessageStore for OfflineStore {
    fn backend(&self) -> &'static str {
        self.backend
    }

    async fn save(&self, _message: &NewContactMessage) -> Result<ContactMessage, StoreError> {
        Err(self.unavailable())
    }

    async fn list(&self, _limit: usize) -> Result<Vec<ContactMessage>, StoreError> {
        Err(self.unavailable())
    }
}
