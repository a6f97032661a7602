//! Error types for the contact service.

use std::fmt;
use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The configured store could not be reached at startup.
    #[error("Store {backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Which input field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "Name"),
            Self::Email => write!(f, "Email"),
            Self::Message => write!(f, "Message"),
        }
    }
}

/// Client-correctable input problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(Field),

    #[error("Please provide a valid email address")]
    InvalidEmail,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::Missing(field) => *field,
            Self::InvalidEmail => Field::Email,
        }
    }
}

/// Coarse failure classes reported for notification sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Auth,
    Connection,
    MalformedResponse,
    Unknown,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Connection => "connection",
            Self::MalformedResponse => "malformed_response",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification sink errors. Always swallowed by the fan-out.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Sink {sink} rejected credentials: {reason}")]
    Auth { sink: String, reason: String },

    #[error("Sink {sink} unreachable: {reason}")]
    Connection { sink: String, reason: String },

    #[error("Sink {sink} timed out after {timeout:?}")]
    Timeout { sink: String, timeout: Duration },

    #[error("Sink {sink} returned HTTP {status}")]
    Rejected { sink: String, status: u16 },

    #[error("Sink {sink} sent a malformed response: {reason}")]
    MalformedResponse { sink: String, reason: String },

    #[error("Sink {sink} failed: {reason}")]
    Other { sink: String, reason: String },
}

impl NotifyError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Auth { .. } => FailureCategory::Auth,
            Self::Connection { .. } | Self::Timeout { .. } => FailureCategory::Connection,
            Self::MalformedResponse { .. } => FailureCategory::MalformedResponse,
            Self::Rejected { .. } | Self::Other { .. } => FailureCategory::Unknown,
        }
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        assert_eq!(
            ValidationError::Missing(Field::Name).to_string(),
            "Name is required"
        );
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "Please provide a valid email address"
        );
        assert_eq!(ValidationError::InvalidEmail.field(), Field::Email);
    }

    #[test]
    fn notify_categories() {
        let timeout = NotifyError::Timeout {
            sink: "webhook".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(timeout.category(), FailureCategory::Connection);

        let rejected = NotifyError::Rejected {
            sink: "webhook".into(),
            status: 500,
        };
        assert_eq!(rejected.category(), FailureCategory::Unknown);
        assert_eq!(rejected.category().as_str(), "unknown");
    }

    #[test]
    fn startup_errors_convert_to_top_level() {
        let err: Error = ConfigError::InvalidValue {
            key: "PORT".into(),
            message: "'eighty': invalid digit".into(),
        }
        .into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("PORT"));

        let err: Error = std::io::Error::from(std::io::ErrorKind::AddrInUse).into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn unavailable_is_detectable() {
        let err = StoreError::Unavailable {
            backend: "mongodb".into(),
            reason: "ping failed".into(),
        };
        assert!(err.is_unavailable());
        assert!(!StoreError::Query("boom".into()).is_unavailable());
    }
}
