//! libSQL backend — file-backed relational `MessageStore`.
//!
//! Opens (creating if absent) a local database file and runs migrations at
//! startup. Identity keys and creation timestamps are assigned by the
//! database itself.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{ContactMessage, MessageId, NewContactMessage};
use crate::store::MessageStore;
use crate::store::migrations;

/// libSQL message store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Pool(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db)?;
        migrations::run_migrations(&store.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let store = Self::from_database(db)?;
        migrations::run_migrations(&store.conn).await?;
        Ok(store)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Our own default writes RFC 3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // CURRENT_TIMESTAMP / datetime() output, with and without fractions
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql Row to a ContactMessage.
///
/// Column order matches MESSAGE_COLUMNS.
fn row_to_message(row: &libsql::Row) -> Result<ContactMessage, libsql::Error> {
    let created_str: String = row.get::<String>(4).unwrap_or_default();

    Ok(ContactMessage {
        id: MessageId::Seq(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        created_at: parse_datetime(&created_str),
    })
}

const MESSAGE_COLUMNS: &str = "id, name, email, message, created_at";

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl MessageStore for LibSqlStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, message: &NewContactMessage) -> Result<ContactMessage, StoreError> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO messages (name, email, message) VALUES (?1, ?2, ?3)
                 RETURNING id, created_at",
                params![
                    message.name.as_str(),
                    message.email.as_str(),
                    message.message.as_str()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_message: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("insert_message: {e}")))?
            .ok_or_else(|| StoreError::Query("insert_message: no row returned".into()))?;

        let id: i64 = row
            .get(0)
            .map_err(|e| StoreError::Serialization(format!("insert_message id: {e}")))?;
        let created_str: String = row
            .get(1)
            .map_err(|e| StoreError::Serialization(format!("insert_message created_at: {e}")))?;

        debug!(id = id, "Message inserted into DB");
        Ok(ContactMessage::from_new(
            MessageId::Seq(id),
            message,
            parse_datetime(&created_str),
        ))
    }

    async fn list(&self, limit: usize) -> Result<Vec<ContactMessage>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY id DESC LIMIT ?1"),
                params![limit],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_messages: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_messages: {e}")))?
        {
            match row_to_message(&row) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    warn!("Skipping message row: {e}");
                }
            }
        }
        Ok(messages)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlStore {
        LibSqlStore::new_memory().await.unwrap()
    }

    fn make_message(name: &str) -> NewContactMessage {
        NewContactMessage {
            name: name.into(),
            email: "ada@example.com".into(),
            message: "hi".into(),
        }
    }

    #[tokio::test]
    async fn save_returns_identity_and_timestamp() {
        let db = test_db().await;
        let before = Utc::now() - chrono::Duration::seconds(5);

        let saved = db.save(&make_message("Ada")).await.unwrap();
        assert_eq!(saved.id, MessageId::Seq(1));
        assert_eq!(saved.name, "Ada");
        assert!(saved.created_at > before);

        let second = db.save(&make_message("Bob")).await.unwrap();
        assert_eq!(second.id, MessageId::Seq(2));
    }

    #[tokio::test]
    async fn list_newest_first() {
        let db = test_db().await;
        db.save(&make_message("Ada")).await.unwrap();
        db.save(&make_message("Bob")).await.unwrap();
        db.save(&make_message("Cy")).await.unwrap();

        let listed = db.list(50).await.unwrap();
        let names: Vec<_> = listed.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Cy", "Bob", "Ada"]);

        let limited = db.list(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "Cy");
    }

    #[tokio::test]
    async fn saved_record_round_trips_through_list() {
        let db = test_db().await;
        let saved = db.save(&make_message("Ada")).await.unwrap();
        let listed = db.list(10).await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn row_errors_fail_the_listing() {
        let db = test_db().await;
        db.save(&make_message("Ada")).await.unwrap();
        db.save(&make_message("Bob")).await.unwrap();

        // abs() of the smallest integer raises "integer overflow" while stepping.
        db.conn
            .execute_batch(
                "ALTER TABLE messages RENAME TO raw_messages;
                 CREATE VIEW messages AS
                     SELECT id, name, email, message,
                            CASE WHEN id = 1 THEN abs(-9223372036854775807 - 1)
                                 ELSE created_at END AS created_at
                     FROM raw_messages;",
            )
            .await
            .unwrap();

        let err = db.list(10).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn local_file_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("messages.db");

        {
            let db = LibSqlStore::new_local(&path).await.unwrap();
            db.save(&make_message("Ada")).await.unwrap();
        }
        assert!(path.exists());

        let reopened = LibSqlStore::new_local(&path).await.unwrap();
        let listed = reopened.list(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ada");
    }

    #[test]
    fn parses_sqlite_timestamps() {
        let dt = parse_datetime("2024-03-01 12:30:00");
        assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        let dt = parse_datetime("2024-03-01T12:30:00.250Z");
        assert_eq!(dt.timestamp_subsec_millis(), 250);

        assert_eq!(parse_datetime("garbage"), DateTime::<Utc>::MIN_UTC);
    }
}
