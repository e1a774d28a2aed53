//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error (medium)      serde_json::Error       ValidationError     │
//! │       │                         │                        │             │
//! │       ▼                         ▼                        ▼             │
//! │  StorageUnavailable         Corrupt                 Validation         │
//! │       │                         │                        │             │
//! │       └─────────────────────────┴────────────────────────┘             │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                 UI collaborator (shown as-is, never retried)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_core::ValidationError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The storage medium could not be read or written.
    ///
    /// ## When This Occurs
    /// - Database file can't be opened or created
    /// - Disk full, permissions, pool closed
    /// - Any SQL execution failure
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A referenced identifier does not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A stored document could not be decoded (or encoded).
    #[error("Corrupt document {namespace}/{key}: {reason}")]
    Corrupt {
        namespace: String,
        key: String,
        reason: String,
    },

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A record handed to a repository breaks a stored invariant.
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(
        namespace: impl Into<String>,
        key: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        DbError::Corrupt {
            namespace: namespace.into(),
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the medium itself failed (as opposed to the data).
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, DbError::StorageUnavailable(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolClosed     → StorageUnavailable("pool is closed")
/// sqlx::Error::PoolTimedOut   → StorageUnavailable("timed out ...")
/// sqlx::Error::Io / Database  → StorageUnavailable(message)
/// ```
///
/// The store only runs keyed statements, so every sqlx failure is treated
/// as the medium being unavailable.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => DbError::StorageUnavailable("pool is closed".to_string()),
            sqlx::Error::PoolTimedOut => {
                DbError::StorageUnavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::Database(db_err) => DbError::StorageUnavailable(db_err.message().to_string()),
            other => DbError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
