//! How the form controller reaches the server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::model::ContactForm;

/// Result of one submission attempt, as seen by the browser-side form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// Server accepted the message; carries its confirmation text.
    Accepted(String),
    /// Server answered with a non-success status.
    Rejected { status: u16, message: String },
    /// No response at all (connection refused, DNS, timeout).
    Unreachable(String),
}

#[async_trait]
pub trait SubmitTransport: Send + Sync {
    async fn submit(&self, form: &ContactForm) -> TransportOutcome;
}

#[derive(Debug, Default, Deserialize)]
struct ServerReply {
    message: Option<String>,
    error: Option<String>,
}

/// Posts the form as JSON to `<base>/api/contact`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: format!("{}/api/contact", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmitTransport for HttpTransport {
    async fn submit(&self, form: &ContactForm) -> TransportOutcome {
        let resp = match self.client.post(&self.endpoint).json(form).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, endpoint = %self.endpoint, "Contact endpoint unreachable");
                return TransportOutcome::Unreachable(e.to_string());
            }
        };

        let status = resp.status();
        let reply: ServerReply = match resp.text().await {
            Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
            Err(e) if e.is_timeout() => return TransportOutcome::Unreachable(e.to_string()),
            Err(_) => ServerReply::default(),
        };

        if status.is_success() {
            TransportOutcome::Accepted(
                reply
                    .message
                    .unwrap_or_else(|| "Message sent successfully!".to_string()),
            )
        } else {
            TransportOutcome::Rejected {
                status: status.as_u16(),
                message: reply
                    .message
                    .or(reply.error)
                    .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
            }
        }
    }
}
