//! Credential storage.
//!
//! The [`SessionManager`](crate::SessionManager) never holds an in-process
//! lock of its own. Each operation it needs is a single call on a
//! [`CredentialStore`], and every store guarantees that call is atomic:
//!
//! - [`insert_if_absent`](CredentialStore::insert_if_absent): two
//!   concurrent first sign-ins for one identity key produce ONE record.
//! - [`rotate_session`](CredentialStore::rotate_session): a renewal is
//!   one compare-and-write keyed by the update token; concurrent renewals
//!   are last-writer-wins but never leave a half-updated record.
//!
//! Uniqueness of identity key, session token and update token is enforced
//! by every store and reported as [`StoreError::Conflict`].

use std::future::Future;

use chrono::{DateTime, Utc};
use focusroom_protocol::IdentityKey;

use crate::{CredentialRecord, StoreError};

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryCredentialStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCredentialStore;

/// New session values written by a renewal.
#[derive(Debug, Clone)]
pub struct SessionRotation {
    pub session_token: String,
    pub session_expiration: DateTime<Utc>,
    /// `Some` replaces the update token too; `None` keeps it.
    pub update_token: Option<String>,
}

/// Persistent home of [`CredentialRecord`]s.
///
/// `Send + Sync + 'static` because one store is shared by every request
/// task for the life of the service.
pub trait CredentialStore: Send + Sync + 'static {
    /// Looks up the record of an identity.
    fn find_by_identity_key(
        &self,
        identity_key: &IdentityKey,
    ) -> impl Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Looks up the record currently holding this session token.
    fn find_by_session_token(
        &self,
        session_token: &str,
    ) -> impl Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Looks up the record holding this update token.
    fn find_by_update_token(
        &self,
        update_token: &str,
    ) -> impl Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Inserts the record, or overwrites the one with the same identity key.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if either token belongs to another identity.
    fn upsert(
        &self,
        record: CredentialRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Inserts the record unless its identity key already exists.
    ///
    /// Returns the record that is stored afterwards: `record` itself if it
    /// was inserted, or the pre-existing one untouched.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if a token of `record` belongs to another
    /// identity.
    fn insert_if_absent(
        &self,
        record: CredentialRecord,
    ) -> impl Future<Output = Result<CredentialRecord, StoreError>> + Send;

    /// Atomically writes `rotation` to the record whose update token equals
    /// `update_token`, returning the updated record.
    ///
    /// Returns `Ok(None)`, with nothing modified, if no record matches.
    fn rotate_session(
        &self,
        update_token: &str,
        rotation: SessionRotation,
    ) -> impl Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;
}
