//! Contact form state machine.
//!
//! `Idle -> Submitting -> Success | Error -> Idle`. Only one submission may be
//! in flight per controller; the terminal states fall back to `Idle` after
//! `revert_after` unless a newer submission has started since.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use super::transport::{SubmitTransport, TransportOutcome};
use crate::model::ContactForm;

pub const DEFAULT_REVERT_AFTER: Duration = Duration::from_secs(5);
pub const UNREACHABLE_MESSAGE: &str =
    "Could not connect to the server. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    Rejected { status: u16, message: String },
    Unreachable,
}

impl FormError {
    /// Text shown to the visitor.
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. } => message,
            Self::Unreachable => UNREACHABLE_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Success(String),
    Error(FormError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing was sent.
    Busy,
    Finished(FormStatus),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct FormState {
    fields: FormFields,
    status: FormStatus,
    /// Bumped on every submission; a pending revert only applies to its own.
    generation: u64,
}

pub struct ContactFormController<T> {
    transport: Arc<T>,
    state: Arc<Mutex<FormState>>,
    revert_after: Duration,
}

impl<T> Clone for ContactFormController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            revert_after: self.revert_after,
        }
    }
}

impl<T: SubmitTransport + 'static> ContactFormController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            state: Arc::new(Mutex::new(FormState::default())),
            revert_after: DEFAULT_REVERT_AFTER,
        }
    }

    pub fn with_revert_after(mut self, revert_after: Duration) -> Self {
        self.revert_after = revert_after;
        self
    }

    pub async fn set_name(&self, value: impl Into<String>) {
        self.state.lock().await.fields.name = value.into();
    }

    pub async fn set_email(&self, value: impl Into<String>) {
        self.state.lock().await.fields.email = value.into();
    }

    pub async fn set_message(&self, value: impl Into<String>) {
        self.state.lock().await.fields.message = value.into();
    }

    pub async fn fields(&self) -> FormFields {
        self.state.lock().await.fields.clone()
    }

    pub async fn status(&self) -> FormStatus {
        self.state.lock().await.status.clone()
    }

    /// Whether the submit control should be enabled.
    pub async fn can_submit(&self) -> bool {
        self.state.lock().await.status != FormStatus::Submitting
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (form, generation) = {
            let mut state = self.state.lock().await;
            if state.status == FormStatus::Submitting {
                return SubmitOutcome::Busy;
            }
            state.status = FormStatus::Submitting;
            state.generation += 1;
            let fields = &state.fields;
            (
                ContactForm::new(&fields.name, &fields.email, &fields.message),
                state.generation,
            )
        };

        let outcome = self.transport.submit(&form).await;

        let status = {
            let mut state = self.state.lock().await;
            state.status = match outcome {
                TransportOutcome::Accepted(message) => {
                    state.fields = FormFields::default();
                    FormStatus::Success(message)
                }
                TransportOutcome::Rejected { status, message } => {
                    FormStatus::Error(FormError::Rejected { status, message })
                }
                TransportOutcome::Unreachable(reason) => {
                    debug!(%reason, "Contact form submission failed");
                    FormStatus::Error(FormError::Unreachable)
                }
            };
            state.status.clone()
        };

        self.schedule_revert(generation);
        SubmitOutcome::Finished(status)
    }

    fn schedule_revert(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let revert_after = self.revert_after;
        tokio::spawn(async move {
            tokio::time::sleep(revert_after).await;
            let mut state = state.lock().await;
            if state.generation == generation && state.status != FormStatus::Submitting {
                state.status = FormStatus::Idle;
            }
        });
    }
}
