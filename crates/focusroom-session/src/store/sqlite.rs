//! SQLite credential store, backed by `sqlx`.
//!
//! The table carries the uniqueness guarantees itself:
//!
//! ```sql
//! identity_key  TEXT PRIMARY KEY
//! session_token TEXT NOT NULL UNIQUE
//! update_token  TEXT NOT NULL UNIQUE
//! ```
//!
//! so concurrency safety comes from SQLite, not from anything held in
//! process. Renewal is a single `UPDATE .. RETURNING` statement.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use focusroom_protocol::IdentityKey;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};

use super::{CredentialStore, SessionRotation};
use crate::{CredentialRecord, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    identity_key       TEXT PRIMARY KEY NOT NULL,
    session_token      TEXT NOT NULL UNIQUE,
    session_expiration TEXT NOT NULL,
    update_token       TEXT NOT NULL UNIQUE
)
"#;

const COLUMNS: &str = "identity_key, session_token, session_expiration, update_token";

/// A [`CredentialStore`] over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Opens (creating if needed) the database at `url` and ensures the
    /// `credentials` table exists.
    ///
    /// `sqlite::memory:` gets a single long-lived connection, since every
    /// new in-memory connection would otherwise see an empty database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 8 })
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::info!(%url, "sqlite credential store ready");
        Ok(store)
    }

    /// Wraps an existing pool. Call [`ensure_schema`](Self::ensure_schema)
    /// before use if the table may not exist yet.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn find_one(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        // `column` is always one of our own literals, never caller input.
        let sql = format!("SELECT {COLUMNS} FROM credentials WHERE {column} = ?1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn find_by_identity_key(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        self.find_one("identity_key", identity_key.as_str()).await
    }

    async fn find_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        self.find_one("session_token", session_token).await
    }

    async fn find_by_update_token(
        &self,
        update_token: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        self.find_one("update_token", update_token).await
    }

    async fn upsert(&self, record: CredentialRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (identity_key, session_token, session_expiration, update_token)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(identity_key) DO UPDATE SET
                session_token = excluded.session_token,
                session_expiration = excluded.session_expiration,
                update_token = excluded.update_token
            "#,
        )
        .bind(record.identity_key.as_str())
        .bind(&record.session_token)
        .bind(record.session_expiration)
        .bind(&record.update_token)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn insert_if_absent(
        &self,
        record: CredentialRecord,
    ) -> Result<CredentialRecord, StoreError> {
        if record.session_token == record.update_token {
            return Err(StoreError::Conflict(
                "session token equals update token".into(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO credentials (identity_key, session_token, session_expiration, update_token)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(identity_key) DO NOTHING
            "#,
        )
        .bind(record.identity_key.as_str())
        .bind(&record.session_token)
        .bind(record.session_expiration)
        .bind(&record.update_token)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        // Whoever won the insert, this is now the stored record.
        self.find_by_identity_key(&record.identity_key)
            .await?
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "record for {} vanished after insert",
                    record.identity_key
                ))
            })
    }

    async fn rotate_session(
        &self,
        update_token: &str,
        rotation: SessionRotation,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let sql = format!(
            r#"
            UPDATE credentials
            SET session_token = ?1,
                session_expiration = ?2,
                update_token = COALESCE(?3, update_token)
            WHERE update_token = ?4
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&rotation.session_token)
            .bind(rotation.session_expiration)
            .bind(rotation.update_token.as_deref())
            .bind(update_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.as_ref().map(row_to_record).transpose()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<CredentialRecord, StoreError> {
    let identity_key: String = row.try_get("identity_key")?;
    let session_expiration: DateTime<Utc> = row.try_get("session_expiration")?;

    Ok(CredentialRecord {
        identity_key: IdentityKey::new(identity_key),
        session_token: row.try_get("session_token")?,
        session_expiration,
        update_token: row.try_get("update_token")?,
    })
}

/// Unique-constraint violations become [`StoreError::Conflict`]; anything
/// else stays a driver error.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}
