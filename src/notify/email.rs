//! Email relay sink — SMTP via lettre.
//!
//! Sends a plain-text + HTML message to the site owner with `Reply-To` set
//! to the submitter, so a reply from the mail client goes straight back.

use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::NotifyError;
use crate::model::Notification;
use crate::notify::Notifier;

const SINK: &str = "email";

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    smtp_host: String,
    timeout: Duration,
}

impl EmailNotifier {
    /// Build the SMTP transport. No connection is made until the first send.
    ///
    /// Port 465 uses implicit TLS; anything else uses STARTTLS.
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let from: Mailbox = config.username.parse().map_err(|e| NotifyError::Other {
            sink: SINK.into(),
            reason: format!("Invalid from address: {e}"),
        })?;
        let to: Mailbox = config.recipient.parse().map_err(|e| NotifyError::Other {
            sink: SINK.into(),
            reason: format!("Invalid recipient address: {e}"),
        })?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| classify(e, timeout))?;

        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            mailer,
            from,
            to,
            smtp_host: config.smtp_host.clone(),
            timeout,
        })
    }

    /// Check connectivity and credentials once, at startup.
    ///
    /// The outcome is only logged by the caller; a failed check never
    /// disables the sink.
    pub async fn verify(&self) -> Result<(), NotifyError> {
        let outcome = tokio::time::timeout(self.timeout, self.mailer.test_connection())
            .await
            .map_err(|_| self.timed_out())?;
        match outcome {
            Ok(true) => {
                info!(host = %self.smtp_host, to = %self.to, "Email relay ready");
                Ok(())
            }
            Ok(false) => Err(NotifyError::Connection {
                sink: SINK.into(),
                reason: format!("{} refused the test connection", self.smtp_host),
            }),
            Err(e) => Err(classify(e, self.timeout)),
        }
    }

    fn timed_out(&self) -> NotifyError {
        NotifyError::Timeout {
            sink: SINK.into(),
            timeout: self.timeout,
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        SINK
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = compose_message(&self.from, &self.to, notification)?;
        // The transport timeout does not cover a server that accepts the
        // connection and then stays silent.
        tokio::time::timeout(self.timeout, self.mailer.send(email))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| classify(e, self.timeout))?;
        info!(to = %self.to, "Contact email sent");
        Ok(())
    }
}

/// Build the multipart notification email.
pub fn compose_message(
    from: &Mailbox,
    to: &Mailbox,
    notification: &Notification,
) -> Result<Message, NotifyError> {
    let reply_to = match notification.email.parse() {
        Ok(address) => Some(Mailbox::new(Some(notification.name.clone()), address)),
        Err(e) => {
            // The permissive validator lets through some addresses SMTP rejects.
            warn!(error = %e, "Submitter address not usable as Reply-To");
            None
        }
    };

    let mut builder = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(format!(
            "New Contact Form Message from {}",
            notification.name
        ));
    if let Some(reply_to) = reply_to {
        builder = builder.reply_to(reply_to);
    }

    let text = render_text(notification).map_err(template_error)?;
    let html = render_html(notification).map_err(template_error)?;

    builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html),
                ),
        )
        .map_err(|e| NotifyError::Other {
            sink: SINK.into(),
            reason: format!("Failed to build email: {e}"),
        })
}

/// Plain-text part of the notification email.
#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactEmailText<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// HTML part. Each message line is escaped separately and joined with `<br>`.
#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactEmailHtml<'a> {
    name: &'a str,
    email: &'a str,
    lines: Vec<&'a str>,
}

pub fn render_text(n: &Notification) -> Result<String, askama::Error> {
    ContactEmailText {
        name: &n.name,
        email: &n.email,
        message: &n.message,
    }
    .render()
}

pub fn render_html(n: &Notification) -> Result<String, askama::Error> {
    ContactEmailHtml {
        name: &n.name,
        email: &n.email,
        lines: n.message.lines().collect(),
    }
    .render()
}

fn template_error(e: askama::Error) -> NotifyError {
    NotifyError::Other {
        sink: SINK.into(),
        reason: format!("Failed to render email: {e}"),
    }
}

/// Map an SMTP error onto the notifier taxonomy.
fn classify(e: SmtpError, timeout: Duration) -> NotifyError {
    let auth_code = e
        .status()
        .map(|code| code.to_string())
        .is_some_and(|code| matches!(code.as_str(), "530" | "534" | "535"));

    if auth_code {
        NotifyError::Auth {
            sink: SINK.into(),
            reason: e.to_string(),
        }
    } else if e.is_timeout() {
        NotifyError::Timeout {
            sink: SINK.into(),
            timeout,
        }
    } else if e.is_response() {
        NotifyError::MalformedResponse {
            sink: SINK.into(),
            reason: e.to_string(),
        }
    } else if e.is_transient() || e.is_permanent() || e.is_client() {
        NotifyError::Other {
            sink: SINK.into(),
            reason: e.to_string(),
        }
    } else {
        NotifyError::Connection {
            sink: SINK.into(),
            reason: e.to_string(),
        }
    }
}
