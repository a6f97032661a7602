//! Best-effort fan-out of submissions to external sinks.
//!
//! Every sink is attempted independently. Failures are logged with the sink
//! name and a failure category and never reach the caller.

pub mod email;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::model::Notification;

pub use email::EmailNotifier;
pub use webhook::WebhookNotifier;

/// A single downstream sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sink identity used in logs.
    fn name(&self) -> &str;

    /// Deliver one notification. Called once; no retries.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Outcome of one sink attempt, as observed by the fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub sink: String,
    pub delivered: bool,
    pub category: Option<&'static str>,
}

/// The configured set of sinks.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Attempt every sink concurrently. Never fails.
    pub async fn notify_all(&self, notification: &Notification) -> Vec<SinkReport> {
        if self.sinks.is_empty() {
            debug!("No notification sinks configured");
            return Vec::new();
        }

        let attempts = self.sinks.iter().map(|sink| async move {
            let result = sink.notify(notification).await;
            match result {
                Ok(()) => {
                    info!(sink = sink.name(), "Notification delivered");
                    SinkReport {
                        sink: sink.name().to_string(),
                        delivered: true,
                        category: None,
                    }
                }
                Err(e) => {
                    let category = e.category();
                    warn!(
                        sink = sink.name(),
                        category = category.as_str(),
                        error = %e,
                        "Notification failed"
                    );
                    SinkReport {
                        sink: sink.name().to_string(),
                        delivered: false,
                        category: Some(category.as_str()),
                    }
                }
            }
        });

        join_all(attempts).await
    }
}
