//! Configuration types, read from the environment at startup.
//!
//! Optional features (durable store, webhook, email relay) are skipped when
//! their variables are absent. A value that is present but malformed is a
//! `ConfigError`.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_MONGO_DATABASE: &str = "portfolio";

/// Deployment mode. Development exposes error details and relaxes CORS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Which persistence backend to open at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// No durable store configured; process-lifetime memory only.
    Memory,
    Sqlite { path: PathBuf },
    Mongo { uri: String, database: String },
}

impl StoreConfig {
    /// Parse a `DATABASE_URL`-style connection string.
    pub fn from_url(url: &str, mongo_database: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
            return Ok(Self::Mongo {
                uri: url.to_string(),
                database: mongo_database.to_string(),
            });
        }

        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .or_else(|| url.strip_prefix("file:"));
        match path {
            Some(p) if !p.is_empty() => Ok(Self::Sqlite {
                path: PathBuf::from(p),
            }),
            _ => Err(ConfigError::InvalidValue {
                key: "DATABASE_URL".into(),
                message: format!("unsupported connection string '{url}'"),
            }),
        }
    }
}

/// Webhook sink settings (e.g. a spreadsheet script endpoint).
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
}

/// Email relay sink settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub recipient: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: Environment,
    /// Allowed cross-origin caller in production.
    pub allowed_origin: Option<String>,
    pub store: StoreConfig,
    pub webhook: Option<WebhookConfig>,
    pub email: Option<EmailConfig>,
    /// Upper bound for each outbound notification call.
    pub notify_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: Environment::default(),
            allowed_origin: None,
            store: StoreConfig::Memory,
            webhook: None,
            email: None,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => parse_value::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let environment = match get("APP_ENV").or_else(|| get("NODE_ENV")) {
            Some(env) if env.eq_ignore_ascii_case("development") || env == "dev" => {
                Environment::Development
            }
            _ => Environment::Production,
        };

        let mongo_database =
            get("MONGO_DATABASE").unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string());
        let store = match get("DATABASE_URL").or_else(|| get("MONGO_URI")) {
            Some(url) => StoreConfig::from_url(&url, &mongo_database)?,
            None => StoreConfig::Memory,
        };

        let webhook = get("WEBHOOK_URL")
            .or_else(|| get("GOOGLE_SHEET_URL"))
            .map(|url| WebhookConfig { url });

        let email = match (get("EMAIL_USER"), get("EMAIL_PASS")) {
            (Some(username), Some(password)) => {
                let smtp_port = match get("SMTP_PORT") {
                    Some(raw) => parse_value::<u16>("SMTP_PORT", &raw)?,
                    None => 587,
                };
                Some(EmailConfig {
                    smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                    smtp_port,
                    recipient: get("RECEIVER_EMAIL").unwrap_or_else(|| username.clone()),
                    username,
                    password: SecretString::from(password),
                })
            }
            _ => None,
        };

        let notify_timeout = match get("NOTIFY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value::<u64>("NOTIFY_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_NOTIFY_TIMEOUT,
        };

        Ok(Self {
            port,
            environment,
            allowed_origin: get("ALLOWED_ORIGIN").or_else(|| get("FRONTEND_URL")),
            store,
            webhook,
            email,
            notify_timeout,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.store, StoreConfig::Memory);
        assert!(config.webhook.is_none());
        assert!(config.email.is_none());
        assert!(config.allowed_origin.is_none());
        assert_eq!(config.notify_timeout, DEFAULT_NOTIFY_TIMEOUT);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn store_selected_from_url() {
        let config = config_from(&[("DATABASE_URL", "sqlite:./data/messages.db")]).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Sqlite {
                path: PathBuf::from("./data/messages.db")
            }
        );

        let config = config_from(&[("MONGO_URI", "mongodb+srv://u:p@cluster.example.net/site")])
            .unwrap();
        assert!(matches!(config.store, StoreConfig::Mongo { ref database, .. } if database == "portfolio"));

        assert!(config_from(&[("DATABASE_URL", "postgres://localhost/db")]).is_err());
    }

    #[test]
    fn database_url_wins_over_mongo_uri() {
        let config = config_from(&[
            ("DATABASE_URL", "file:messages.db"),
            ("MONGO_URI", "mongodb://localhost"),
        ])
        .unwrap();
        assert!(matches!(config.store, StoreConfig::Sqlite { .. }));
    }

    #[test]
    fn email_requires_user_and_password() {
        let config = config_from(&[("EMAIL_USER", "me@example.com")]).unwrap();
        assert!(config.email.is_none());

        let config = config_from(&[
            ("EMAIL_USER", "me@example.com"),
            ("EMAIL_PASS", "app-password"),
        ])
        .unwrap();
        let email = config.email.unwrap();
        assert_eq!(email.recipient, "me@example.com");
        assert_eq!(email.smtp_host, "smtp.gmail.com");
        assert_eq!(email.smtp_port, 587);
        assert_eq!(email.password.expose_secret(), "app-password");
    }

    #[test]
    fn legacy_variable_names_are_honoured() {
        let config = config_from(&[
            ("NODE_ENV", "development"),
            ("GOOGLE_SHEET_URL", "https://script.example.com/exec"),
            ("FRONTEND_URL", "https://me.example.com"),
        ])
        .unwrap();
        assert!(config.environment.is_development());
        assert_eq!(
            config.webhook.unwrap().url,
            "https://script.example.com/exec"
        );
        assert_eq!(
            config.allowed_origin.as_deref(),
            Some("https://me.example.com")
        );
    }

    #[test]
    fn blank_values_count_as_absent() {
        let config = config_from(&[("WEBHOOK_URL", "  "), ("PORT", "")]).unwrap();
        assert!(config.webhook.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
