//! The session manager: issues, renews, and checks credentials.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating credentials the first time an identity signs in
//! - Minting a new session token when a client presents its update token
//! - Deciding whether a presented session token is still good
//!
//! # Concurrency note
//!
//! Unlike a registry that owns its map, `SessionManager` holds no mutable
//! state at all: every method takes `&self`, and each state change is a
//! single atomic [`CredentialStore`] call. Share it behind an `Arc` and call
//! it from as many request tasks as you like.

use chrono::{DateTime, Duration, Utc};
use focusroom_protocol::IdentityKey;

use crate::{
    Clock, CredentialRecord, CredentialStore, IdentityVerifier, MAX_SESSION_WINDOW_SECS,
    SessionConfig, SessionError, SessionRotation, SystemClock, generate_token,
};

/// Issues and verifies paired session/update tokens.
///
/// ## Lifecycle
///
/// ```text
/// sign_in() ──→ create_or_get_user() ──→ [record: st1, ut]
///                                             │
///              verify(st1) == true  ◄─────────┤  until now >= expiration
///                                             │
///              renew(ut) ─────────────→ [record: st2, ut]
///                                             │
///              verify(st1) == false, verify(st2) == true
/// ```
pub struct SessionManager<S, C = SystemClock> {
    store: S,
    clock: C,
    config: SessionConfig,
}

impl<S: CredentialStore> SessionManager<S> {
    /// Creates a manager over `store` that reads the system clock.
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: CredentialStore, C: Clock> SessionManager<S, C> {
    /// Creates a manager with an explicit clock (tests use
    /// [`ManualClock`](crate::ManualClock)).
    pub fn with_clock(store: S, config: SessionConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Verifies an identity assertion, then loads or creates the user's
    /// credentials.
    pub async fn sign_in<I: IdentityVerifier>(
        &self,
        verifier: &I,
        assertion: &str,
    ) -> Result<CredentialRecord, SessionError> {
        let identity_key = match verifier.verify_identity(assertion).await {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "identity assertion rejected");
                return Err(e);
            }
        };
        self.create_or_get_user(&identity_key).await
    }

    /// Returns the credentials of `identity_key`, creating them on first
    /// sign-in.
    ///
    /// Idempotent: once a record exists it is returned unchanged. Signing in
    /// again does NOT rotate either token.
    ///
    /// # Errors
    /// - [`SessionError::IdentityAssertionInvalid`]: empty identity key
    /// - [`SessionError::ExpirationOutOfRange`]: the window overflows
    /// - [`SessionError::Store`]: the store failed or reported a conflict
    pub async fn create_or_get_user(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<CredentialRecord, SessionError> {
        if identity_key.as_str().is_empty() {
            return Err(SessionError::IdentityAssertionInvalid(
                "empty identity key".into(),
            ));
        }

        if let Some(existing) = self.store.find_by_identity_key(identity_key).await? {
            tracing::debug!(%identity_key, "returning existing credentials");
            return Ok(existing);
        }

        let candidate = CredentialRecord {
            identity_key: identity_key.clone(),
            session_token: generate_token(),
            session_expiration: self.next_expiration()?,
            update_token: generate_token(),
        };
        let candidate_token = candidate.session_token.clone();

        // A concurrent first sign-in may have won between the lookup and
        // here; insert_if_absent hands back whichever record is stored.
        let stored = self.store.insert_if_absent(candidate).await?;
        if stored.session_token == candidate_token {
            tracing::info!(%identity_key, expires = %stored.session_expiration, "credentials created");
        } else {
            tracing::debug!(%identity_key, "concurrent sign-in created credentials first");
        }
        Ok(stored)
    }

    /// Mints a new session token for the holder of `update_token`.
    ///
    /// The expiration restarts at `now + session_window`. The update token
    /// stays the same unless [`SessionConfig::rotate_update_token`] is set.
    ///
    /// # Errors
    /// - [`SessionError::InvalidUpdateToken`]: no record has this update
    ///   token; nothing was modified
    /// - [`SessionError::Store`]: the store failed
    pub async fn renew(
        &self,
        update_token: &str,
    ) -> Result<CredentialRecord, SessionError> {
        if update_token.is_empty() {
            return Err(SessionError::InvalidUpdateToken);
        }

        let rotation = SessionRotation {
            session_token: generate_token(),
            session_expiration: self.next_expiration()?,
            update_token: self.config.rotate_update_token.then(generate_token),
        };

        match self.store.rotate_session(update_token, rotation).await? {
            Some(record) => {
                tracing::info!(
                    identity_key = %record.identity_key,
                    expires = %record.session_expiration,
                    rotated_update_token = self.config.rotate_update_token,
                    "session renewed"
                );
                Ok(record)
            }
            None => {
                tracing::debug!("renewal rejected: unknown update token");
                Err(SessionError::InvalidUpdateToken)
            }
        }
    }

    /// Returns the record holding `session_token` if it is still valid.
    ///
    /// # Errors
    /// - [`SessionError::ExpiredOrUnknownSessionToken`]: no such token, or
    ///   it is past its expiration; the two cases are
    ///   indistinguishable
    /// - [`SessionError::Store`]: the store failed
    pub async fn resolve(
        &self,
        session_token: &str,
    ) -> Result<CredentialRecord, SessionError> {
        if session_token.is_empty() {
            return Err(SessionError::ExpiredOrUnknownSessionToken);
        }

        let record = self
            .store
            .find_by_session_token(session_token)
            .await?
            .ok_or(SessionError::ExpiredOrUnknownSessionToken)?;

        if !record.is_session_valid_at(self.clock.now()) {
            tracing::debug!(identity_key = %record.identity_key, "session token expired");
            return Err(SessionError::ExpiredOrUnknownSessionToken);
        }

        Ok(record)
    }

    /// Returns `true` only if `session_token` belongs to a record and
    /// `now < session_expiration`.
    ///
    /// Never fails: unknown, expired, and store errors all read as `false`.
    pub async fn verify(&self, session_token: &str) -> bool {
        match self.resolve(session_token).await {
            Ok(_) => true,
            Err(SessionError::Store(e)) => {
                tracing::error!(error = %e, "credential store failed during verify");
                false
            }
            Err(_) => false,
        }
    }

    fn next_expiration(&self) -> Result<DateTime<Utc>, SessionError> {
        let window = self.config.session_window;
        if window > Duration::seconds(MAX_SESSION_WINDOW_SECS) {
            tracing::error!(window_secs = window.num_seconds(), "session window too long");
            return Err(SessionError::ExpirationOutOfRange);
        }
        self.clock
            .now()
            .checked_add_signed(window)
            .ok_or(SessionError::ExpirationOutOfRange)
    }
}

// =========================================================================
// Tests
// =========================================================================
