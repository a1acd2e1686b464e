//! Repository error types

use thiserror::Error;

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;

/// Errors surfaced by the key-metadata repository
#[derive(Debug, Error)]
pub enum DbError {
    /// No metadata row for the given public key
    #[error("key metadata not found: {0}")]
    KeyNotFound(String),

    /// A row already exists for the given public key
    #[error("key metadata already exists: {0}")]
    AlreadyExists(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure (fatal at startup)
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
