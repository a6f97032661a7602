//! Submission handling: validate, persist, fan out.
//!
//! This is the transport-independent core behind the HTTP routes. A
//! submission is accepted once it validates; storage and notification
//! problems are logged and never change the outcome.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::model::{ContactForm, ContactMessage, Notification};
use crate::notify::{FanOut, SinkReport};
use crate::store::MessageStore;
use crate::validation;

/// Most messages a single listing call may return.
pub const MAX_LIST_LIMIT: usize = 50;

/// What happened to an accepted submission.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// The stored record, or `None` when persistence was skipped or failed.
    pub stored: Option<ContactMessage>,
    pub notifications: Vec<SinkReport>,
}

/// Context object shared by all request handlers.
#[derive(Clone)]
pub struct SubmissionHandler {
    store: Arc<dyn MessageStore>,
    notifier: FanOut,
}

impl SubmissionHandler {
    pub fn new(store: Arc<dyn MessageStore>, notifier: FanOut) -> Self {
        Self { store, notifier }
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn notifier(&self) -> &FanOut {
        &self.notifier
    }

    /// Accept a contact form submission.
    ///
    /// Only validation can fail this call. Nothing is stored or sent for an
    /// invalid form.
    pub async fn submit(&self, form: &ContactForm) -> Result<Receipt, ValidationError> {
        let new = validation::validate(form).inspect_err(|e| {
            info!(field = %e.field(), "Rejected contact form: {e}");
        })?;

        let stored = match self.store.save(&new).await {
            Ok(message) => {
                info!(
                    id = %message.id,
                    backend = self.store.backend(),
                    "Contact message saved"
                );
                Some(message)
            }
            Err(e) if e.is_unavailable() => {
                warn!(backend = self.store.backend(), error = %e, "Store unavailable, message not saved");
                None
            }
            Err(e) => {
                error!(backend = self.store.backend(), error = %e, "Failed to save contact message");
                None
            }
        };

        let notification = match &stored {
            Some(message) => Notification::stored(message),
            None => Notification::unsaved(&new),
        };
        let notifications = self.notifier.notify_all(&notification).await;

        Ok(Receipt {
            stored,
            notifications,
        })
    }

    /// Most recent messages first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<ContactMessage>, StoreError> {
        let limit = clamp_limit(limit);
        self.store.list(limit).await.inspect_err(|e| {
            error!(backend = self.store.backend(), error = %e, "Failed to list messages");
        })
    }
}

pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(MAX_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::NotifyError;
    use crate::notify::Notifier;
    use crate::store::{MemoryStore, OfflineStore};

    /// Records what it was sent.
    #[derive(Default)]
    struct RecordingSink {
        seen: tokio::sync::Mutex<Vec<Notification>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().await.push(notification.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl Notifier for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Connection {
                sink: "broken".into(),
                reason: "connection refused".into(),
            })
        }
    }

    fn handler_with(store: Arc<dyn MessageStore>, sink: Arc<RecordingSink>) -> SubmissionHandler {
        let sinks: Vec<Arc<dyn Notifier>> = vec![sink, Arc::new(BrokenSink)];
        SubmissionHandler::new(store, FanOut::new(sinks))
    }

    fn form() -> ContactForm {
        ContactForm::new("  Ada  ", "ada@example.com", "Hello there")
    }

    #[tokio::test]
    async fn valid_submission_is_stored_and_notified() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let handler = handler_with(store.clone(), sink.clone());

        let receipt = handler.submit(&form()).await.unwrap();

        let stored = receipt.stored.unwrap();
        assert_eq!(stored.name, "Ada");
        assert_eq!(store.len().await, 1);

        let seen = sink.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, Some(stored.id.clone()));
        assert_eq!(receipt.notifications.len(), 2);
        assert!(!receipt.notifications[1].delivered);
        assert_eq!(receipt.notifications[1].category, Some("connection"));
    }

    #[tokio::test]
    async fn invalid_submission_stores_and_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let handler = handler_with(store.clone(), sink.clone());

        let err = handler
            .submit(&ContactForm::new("Ada", "not-an-email", "hi"))
            .await
            .unwrap_err();

        assert_eq!(err, ValidationError::InvalidEmail);
        assert!(store.is_empty().await);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_store_still_accepts_and_notifies() {
        let store = Arc::new(OfflineStore::new("mongodb", "connection refused"));
        let sink = Arc::new(RecordingSink::default());
        let handler = handler_with(store, sink.clone());

        let receipt = handler.submit(&form()).await.unwrap();

        assert!(receipt.stored.is_none());
        let seen = sink.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert!(seen[0].id.is_none());
        assert_eq!(seen[0].email, "ada@example.com");
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_clamped() {
        let store = Arc::new(MemoryStore::new());
        let handler = SubmissionHandler::new(store, FanOut::empty());
        for i in 0..60 {
            handler
                .submit(&ContactForm::new("Ada", "ada@example.com", format!("msg {i}")))
                .await
                .unwrap();
        }

        let all = handler.list_recent(None).await.unwrap();
        assert_eq!(all.len(), MAX_LIST_LIMIT);
        assert_eq!(all[0].message, "msg 59");

        let two = handler.list_recent(Some(2)).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[1].message, "msg 58");

        assert_eq!(handler.list_recent(Some(0)).await.unwrap().len(), 1);
        assert_eq!(handler.list_recent(Some(500)).await.unwrap().len(), MAX_LIST_LIMIT);
    }

    #[tokio::test]
    async fn list_on_unavailable_store_is_an_error() {
        let handler =
            SubmissionHandler::new(Arc::new(OfflineStore::new("sqlite", "disk")), FanOut::empty());
        assert!(handler.list_recent(None).await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_ids() {
        let handler = SubmissionHandler::new(Arc::new(MemoryStore::new()), FanOut::empty());

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler
                        .submit(&ContactForm::new("Ada", "ada@example.com", format!("m{i}")))
                        .await
                        .unwrap()
                        .stored
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(51)), 50);
    }
}
