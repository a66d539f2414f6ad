//! Error types for the confero-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Uses `thiserror` for ergonomic, zero-cost error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store directory could not be created or inspected.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded engine rejected an operation (open, transaction,
    /// table access, or commit).
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    /// Another process still holds the store's exclusive file lock.
    ///
    /// The store supports a single writer process at a time; opening fails
    /// fast instead of blocking indefinitely on a lock that may never be
    /// released.
    #[error("store at {} is locked by another process (gave up after {waited_ms}ms)", .path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    /// A stored record failed to decode.
    ///
    /// Surfaced by `get` for the record itself and by `list`, which aborts
    /// the whole scan rather than silently omitting the record.
    #[error("corrupt {entity} record at key {key}: {reason}")]
    CorruptRecord {
        entity: &'static str,
        key: String,
        reason: String,
    },

    /// An entity failed to encode for storage.
    #[error("failed to encode {entity}: {source}")]
    Encode {
        entity: &'static str,
        #[source]
        source: bincode::Error,
    },

    /// The requested record was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A ticket referenced a user or event that does not exist.
    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: u64 },

    /// A ticket for this (user, event) pair already exists.
    #[error("ticket already exists for user {user_id} and event {event_id}")]
    DuplicateTicket { user_id: u64, event_id: u64 },

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

// redb reports each transaction phase through its own error type; funnel
// them all through the unified `redb::Error` so `?` works everywhere.

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Redb(err.into())
    }
}
