//! `SQLite` credential store.
//!
//! The primary key on `identifier` is the only duplicate check that matters:
//! a concurrent insert that loses the race gets a unique violation, which maps
//! to `StoreError::Duplicate`.

use super::{validate_identifier, CredentialStore, PasswordHasher, StoreError};
use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS credentials (
        identifier TEXT PRIMARY KEY NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    hasher: PasswordHasher,
}

impl SqliteStore {
    /// Connect to `dsn` (e.g. `sqlite://users.db` or `sqlite::memory:`) and
    /// create the schema when missing.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid or the database is unreachable.
    pub async fn connect(dsn: &str, hasher: PasswordHasher) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);

        // each connection to an in-memory database is a separate database
        let pool = if dsn.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        Self::with_pool(pool, hasher).await
    }

    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn with_pool(pool: SqlitePool, hasher: PasswordHasher) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        debug!("Credential table ready");

        Ok(Self { pool, hasher })
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn exists(&self, identifier: &str) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM credentials WHERE identifier = ?) AS found",
        )
        .bind(identifier)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    #[instrument(skip(self, password))]
    async fn verify(&self, identifier: &str, password: &SecretString) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT password_hash FROM credentials WHERE identifier = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let password_hash: String = row.try_get("password_hash")?;
                self.hasher.verify(password, &password_hash).await
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, password))]
    async fn insert(&self, identifier: &str, password: &SecretString) -> Result<(), StoreError> {
        validate_identifier(identifier)?;

        if self.exists(identifier).await? {
            return Err(StoreError::Duplicate);
        }

        let password_hash = self.hasher.hash(password).await?;

        match sqlx::query("INSERT INTO credentials (identifier, password_hash) VALUES (?, ?)")
            .bind(identifier)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
