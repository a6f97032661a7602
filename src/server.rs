//! Startup wiring: pick the store and sinks from config, build the router,
//! serve until shutdown.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::api::{AppState, contact_routes};
use crate::config::{DEFAULT_ALLOWED_ORIGIN, ServerConfig, StoreConfig};
use crate::notify::{EmailNotifier, FanOut, Notifier, WebhookNotifier};
use crate::store::{LibSqlStore, MemoryStore, MessageStore, OfflineStore};
use crate::submission::SubmissionHandler;

/// Open the configured store.
///
/// A backend that cannot be opened is replaced by an `OfflineStore`, so the
/// service still starts and submissions still reach the sinks.
pub async fn build_store(config: &StoreConfig) -> Arc<dyn MessageStore> {
    match config {
        StoreConfig::Memory => {
            warn!("No DATABASE_URL set, messages are kept in memory only");
            Arc::new(MemoryStore::new())
        }
        StoreConfig::Sqlite { path } => match LibSqlStore::new_local(path).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "SQLite store unavailable");
                Arc::new(OfflineStore::new("sqlite", e.to_string()))
            }
        },
        StoreConfig::Mongo { uri, database } => open_mongo(uri, database).await,
    }
}

#[cfg(feature = "mongodb")]
async fn open_mongo(uri: &str, database: &str) -> Arc<dyn MessageStore> {
    match crate::store::MongoStore::connect(uri, database).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "MongoDB store unavailable");
            Arc::new(OfflineStore::new("mongodb", e.to_string()))
        }
    }
}

#[cfg(not(feature = "mongodb"))]
async fn open_mongo(_uri: &str, database: &str) -> Arc<dyn MessageStore> {
    warn!(
        database,
        "MongoDB URI configured but this build lacks the `mongodb` feature"
    );
    Arc::new(OfflineStore::new(
        "mongodb",
        "built without the mongodb feature",
    ))
}

/// Build the notification sinks that are configured. Missing ones are skipped
/// with a warning.
///
/// The email relay is checked in the background; the result is only logged.
pub async fn build_notifiers(config: &ServerConfig) -> FanOut {
    let mut sinks: Vec<Arc<dyn Notifier>> = Vec::new();

    match &config.webhook {
        Some(webhook) => match WebhookNotifier::new(webhook.url.clone(), config.notify_timeout) {
            Ok(sink) => {
                info!(url = %sink.url(), "Webhook sink enabled");
                sinks.push(Arc::new(sink));
            }
            Err(e) => warn!(error = %e, "Webhook sink disabled"),
        },
        None => warn!("WEBHOOK_URL not set, webhook sink disabled"),
    }

    match &config.email {
        Some(email) => match EmailNotifier::new(email, config.notify_timeout) {
            Ok(sink) => {
                let sink = Arc::new(sink);
                let relay = Arc::clone(&sink);
                tokio::spawn(async move {
                    if let Err(e) = relay.verify().await {
                        warn!(
                            category = e.category().as_str(),
                            error = %e,
                            "Email relay check failed"
                        );
                    }
                });
                sinks.push(sink);
            }
            Err(e) => warn!(error = %e, "Email sink disabled"),
        },
        None => warn!("EMAIL_USER/EMAIL_PASS not set, email sink disabled"),
    }

    FanOut::new(sinks)
}

pub async fn build_state(config: &ServerConfig) -> AppState {
    let store = build_store(&config.store).await;
    let notifier = build_notifiers(config).await;
    AppState {
        handler: SubmissionHandler::new(store, notifier),
        environment: config.environment,
    }
}

/// Development mirrors any origin; production allows exactly one.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    if config.environment.is_development() {
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let origin = match config.allowed_origin.as_deref() {
        Some(origin) => origin,
        None => {
            warn!(
                origin = DEFAULT_ALLOWED_ORIGIN,
                "ALLOWED_ORIGIN not set, using default"
            );
            DEFAULT_ALLOWED_ORIGIN
        }
    };
    let origin = HeaderValue::from_str(origin).unwrap_or_else(|e| {
        warn!(origin, error = %e, "Invalid ALLOWED_ORIGIN, using default");
        HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)
    });
    base.allow_origin(origin)
}

/// Full application: routes plus CORS.
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    contact_routes(state).layer(cors_layer(config))
}

/// Serve until Ctrl+C / SIGTERM.
pub async fn run(config: ServerConfig) -> crate::error::Result<()> {
    let state = build_state(&config).await;
    info!(
        store = state.handler.store_backend(),
        sinks = ?state.handler.notifier().sink_names(),
        development = config.environment.is_development(),
        "Contact service configured"
    );
    let app = build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "Contact service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
