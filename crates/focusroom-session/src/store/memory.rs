//! In-memory credential store.
//!
//! Three maps kept in sync under ONE `RwLock`: the records themselves,
//! keyed by identity, plus an index per token so lookups by token don't
//! scan every record. Each trait method takes the lock once, which is what
//! makes it atomic.

use std::collections::HashMap;

use focusroom_protocol::IdentityKey;
use tokio::sync::RwLock;

use super::{CredentialStore, SessionRotation};
use crate::{CredentialRecord, StoreError};

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<IdentityKey, CredentialRecord>,
    by_session_token: HashMap<String, IdentityKey>,
    by_update_token: HashMap<String, IdentityKey>,
}

impl Tables {
    /// Fails if `token` is indexed under an identity other than `owner`.
    fn check_free(
        index: &HashMap<String, IdentityKey>,
        token: &str,
        owner: &IdentityKey,
        what: &str,
    ) -> Result<(), StoreError> {
        match index.get(token) {
            Some(holder) if holder != owner => Err(StoreError::Conflict(
                format!("{what} already issued to another identity"),
            )),
            _ => Ok(()),
        }
    }

    fn check_tokens_free(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if record.session_token == record.update_token {
            return Err(StoreError::Conflict(
                "session token equals update token".into(),
            ));
        }
        Self::check_free(
            &self.by_session_token,
            &record.session_token,
            &record.identity_key,
            "session token",
        )?;
        Self::check_free(
            &self.by_update_token,
            &record.update_token,
            &record.identity_key,
            "update token",
        )
    }

    /// Replaces (or inserts) a record and re-points both indices.
    fn put(&mut self, record: CredentialRecord) {
        if let Some(old) = self.records.get(&record.identity_key) {
            self.by_session_token.remove(&old.session_token);
            self.by_update_token.remove(&old.update_token);
        }
        self.by_session_token
            .insert(record.session_token.clone(), record.identity_key.clone());
        self.by_update_token
            .insert(record.update_token.clone(), record.identity_key.clone());
        self.records.insert(record.identity_key.clone(), record);
    }

    fn lookup(
        &self,
        index: &HashMap<String, IdentityKey>,
        token: &str,
    ) -> Option<CredentialRecord> {
        index
            .get(token)
            .and_then(|key| self.records.get(key))
            .cloned()
    }
}

/// A [`CredentialStore`] that lives in process memory.
///
/// Good for tests, demos and single-process deployments that can afford to
/// lose every session on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.records.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn find_by_identity_key(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.tables.read().await.records.get(identity_key).cloned())
    }

    async fn find_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_session_token, session_token))
    }

    async fn find_by_update_token(
        &self,
        update_token: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_update_token, update_token))
    }

    async fn upsert(&self, record: CredentialRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_tokens_free(&record)?;
        tables.put(record);
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        record: CredentialRecord,
    ) -> Result<CredentialRecord, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.records.get(&record.identity_key) {
            return Ok(existing.clone());
        }
        tables.check_tokens_free(&record)?;
        tables.put(record.clone());
        Ok(record)
    }

    async fn rotate_session(
        &self,
        update_token: &str,
        rotation: SessionRotation,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(mut record) = tables.lookup(&tables.by_update_token, update_token)
        else {
            return Ok(None);
        };

        record.session_token = rotation.session_token;
        record.session_expiration = rotation.session_expiration;
        if let Some(next_update) = rotation.update_token {
            record.update_token = next_update;
        }

        tables.check_tokens_free(&record)?;
        tables.put(record.clone());
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn record(key: &str, session: &str, update: &str) -> CredentialRecord {
        CredentialRecord {
            identity_key: IdentityKey::new(key),
            session_token: session.into(),
            session_expiration: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
            update_token: update.into(),
        }
    }

    fn rotation(session: &str, update: Option<&str>) -> SessionRotation {
        SessionRotation {
            session_token: session.into(),
            session_expiration: Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap(),
            update_token: update.map(Into::into),
        }
    }

    // =====================================================================
    // insert_if_absent()
    // =====================================================================

    #[tokio::test]
    async fn test_insert_if_absent_new_identity_inserts() {
        let store = MemoryCredentialStore::new();

        let stored = store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();

        assert_eq!(stored.session_token, "s1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent_existing_identity_returns_original() {
        let store = MemoryCredentialStore::new();
        store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();

        let stored = store.insert_if_absent(record("u1", "s2", "up2")).await.unwrap();

        assert_eq!(stored.session_token, "s1");
        assert_eq!(stored.update_token, "up1");
        assert!(store.find_by_session_token("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_token_collision_returns_conflict() {
        let store = MemoryCredentialStore::new();
        store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();

        let result = store.insert_if_absent(record("u2", "s1", "up2")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent_equal_tokens_returns_conflict() {
        let store = MemoryCredentialStore::new();

        let result = store.insert_if_absent(record("u1", "same", "same")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.is_empty().await);
    }

    // =====================================================================
    // rotate_session()
    // =====================================================================

    #[tokio::test]
    async fn test_rotate_session_reindexes_session_token() {
        let store = MemoryCredentialStore::new();
        store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();

        let updated = store
            .rotate_session("up1", rotation("s2", None))
            .await
            .unwrap()
            .expect("record should match");

        assert_eq!(updated.session_token, "s2");
        assert_eq!(updated.update_token, "up1");
        assert!(store.find_by_session_token("s1").await.unwrap().is_none());
        assert_eq!(
            store.find_by_session_token("s2").await.unwrap().unwrap().identity_key,
            IdentityKey::new("u1")
        );
    }

    #[tokio::test]
    async fn test_rotate_session_with_update_token_retires_old_one() {
        let store = MemoryCredentialStore::new();
        store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();

        store
            .rotate_session("up1", rotation("s2", Some("up2")))
            .await
            .unwrap();

        assert!(store.find_by_update_token("up1").await.unwrap().is_none());
        assert!(store.find_by_update_token("up2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_session_unknown_token_changes_nothing() {
        let store = MemoryCredentialStore::new();
        let original = record("u1", "s1", "up1");
        store.insert_if_absent(original.clone()).await.unwrap();

        let result = store.rotate_session("nope", rotation("s2", None)).await.unwrap();

        assert!(result.is_none());
        assert_eq!(
            store.find_by_identity_key(&IdentityKey::new("u1")).await.unwrap(),
            Some(original)
        );
    }

    #[tokio::test]
    async fn test_rotate_session_colliding_token_leaves_record_intact() {
        let store = MemoryCredentialStore::new();
        store.insert_if_absent(record("u1", "s1", "up1")).await.unwrap();
        store.insert_if_absent(record("u2", "s2", "up2")).await.unwrap();

        let result = store.rotate_session("up1", rotation("s2", None)).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        let u1 = store.find_by_update_token("up1").await.unwrap().unwrap();
        assert_eq!(u1.session_token, "s1");
    }

    // =====================================================================
    // upsert()
    // =====================================================================

    #[tokio::test]
    async fn test_upsert_overwrites_same_identity() {
        let store = MemoryCredentialStore::new();
        store.upsert(record("u1", "s1", "up1")).await.unwrap();

        let mut next = record("u1", "s9", "up9");
        next.session_expiration += Duration::hours(1);
        store.upsert(next.clone()).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.find_by_session_token("s1").await.unwrap().is_none());
        assert!(store.find_by_update_token("up1").await.unwrap().is_none());
        assert_eq!(store.find_by_session_token("s9").await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn test_upsert_foreign_update_token_returns_conflict() {
        let store = MemoryCredentialStore::new();
        store.upsert(record("u1", "s1", "up1")).await.unwrap();

        let result = store.upsert(record("u2", "s2", "up1")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
