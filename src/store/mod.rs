//! Credential storage.
//!
//! A credential record is an `(identifier, password_hash)` pair. Handlers talk to
//! storage only through [`CredentialStore`], so the backing medium is chosen at
//! startup: a flat file ([`file::FileStore`]) or `SQLite` ([`sqlite::SqliteStore`]).
//!
//! Plaintext passwords never reach the medium; both backends persist bcrypt
//! hashes produced by [`password::PasswordHasher`].

pub mod file;
pub mod identifier;
pub mod password;
pub mod sqlite;

pub use self::identifier::validate_identifier;
pub use self::password::PasswordHasher;

use async_trait::async_trait;
use secrecy::SecretString;
use std::{fmt, sync::Arc};
use thiserror::Error;

/// Field delimiter of the flat-file format.
pub const DELIMITER: char = ',';

/// A stored `(identifier, password_hash)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub identifier: String,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error("identifier already exists")]
    Duplicate,
    #[error("corrupt credential record at line {line}")]
    Corrupt { line: usize },
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Storage capability used by the HTTP handlers.
#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// True iff a record with exactly this identifier exists.
    async fn exists(&self, identifier: &str) -> Result<bool, StoreError>;

    /// Check `password` against the stored hash. Unknown identifiers yield `false`.
    async fn verify(&self, identifier: &str, password: &SecretString) -> Result<bool, StoreError>;

    /// Hash `password` and persist a new record.
    ///
    /// # Errors
    /// `InvalidIdentifier` before any storage access, `Duplicate` when the
    /// identifier is taken, otherwise a storage error. Failed writes leave the
    /// previous state intact.
    async fn insert(&self, identifier: &str, password: &SecretString) -> Result<(), StoreError>;

    /// Cheap readiness check.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn CredentialStore>;

/// Where credentials live, as selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    File(std::path::PathBuf),
    Sqlite(String),
}

/// Open the configured backend.
///
/// # Errors
/// Returns an error if the file cannot be created or read, or the database is unreachable.
pub async fn open(backend: &Backend, hasher: PasswordHasher) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match backend {
        Backend::File(path) => Arc::new(file::FileStore::open(path, hasher).await?),
        Backend::Sqlite(dsn) => Arc::new(sqlite::SqliteStore::connect(dsn, hasher).await?),
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages_do_not_leak_paths() {
        let err = StoreError::Corrupt { line: 3 };
        assert_eq!(err.to_string(), "corrupt credential record at line 3");
        assert_eq!(StoreError::Duplicate.to_string(), "identifier already exists");
    }

    #[tokio::test]
    async fn test_open_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        let store = open(&Backend::File(path.clone()), PasswordHasher::new(4).unwrap())
            .await
            .unwrap();

        assert!(store.ping().await.is_ok());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_sqlite_backend() {
        let store = open(
            &Backend::Sqlite("sqlite::memory:".to_string()),
            PasswordHasher::new(4).unwrap(),
        )
        .await
        .unwrap();

        assert!(store.ping().await.is_ok());
        assert!(!store.exists("alice1").await.unwrap());
    }
}
