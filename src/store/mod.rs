//! Persistence layer — pluggable append-only message stores.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod offline;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
pub use offline::OfflineStore;
pub use traits::MessageStore;
