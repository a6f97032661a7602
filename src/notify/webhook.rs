//! Webhook sink — POSTs each submission as JSON to a configured URL.
//!
//! Used for spreadsheet scripts and similar collectors. One attempt, bounded
//! by the client timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::NotifyError;
use crate::model::Notification;
use crate::notify::Notifier;

const SINK: &str = "webhook";

pub struct WebhookNotifier {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Other {
                sink: SINK.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, e: reqwest::Error) -> NotifyError {
        if e.is_timeout() {
            NotifyError::Timeout {
                sink: SINK.into(),
                timeout: self.timeout,
            }
        } else if e.is_connect() || e.is_request() {
            NotifyError::Connection {
                sink: SINK.into(),
                reason: e.to_string(),
            }
        } else {
            NotifyError::Other {
                sink: SINK.into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        SINK
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(NotifyError::Auth {
                sink: SINK.into(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                sink: SINK.into(),
                status: status.as_u16(),
            });
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if is_json && !body.trim().is_empty() {
            serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
                NotifyError::MalformedResponse {
                    sink: SINK.into(),
                    reason: e.to_string(),
                }
            })?;
        }

        debug!(status = status.as_u16(), "Webhook accepted notification");
        Ok(())
    }
}
