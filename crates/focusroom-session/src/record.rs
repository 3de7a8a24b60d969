//! Credential records: what the server remembers about a signed-in user.
//!
//! A record tracks:
//! - WHO the user is (`IdentityKey` from the identity provider)
//! - WHAT they present on every request (the session token)
//! - WHEN that session token stops working (the expiration)
//! - HOW they get a new one without signing in again (the update token)

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use focusroom_protocol::{IdentityKey, SessionPayload};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Longest accepted [`SessionConfig::session_window`]: ten years.
pub const MAX_SESSION_WINDOW_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for credential issuance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session token stays valid after it is issued or renewed.
    ///
    /// Default: 1 day. Windows longer than [`MAX_SESSION_WINDOW_SECS`]
    /// make sign-in and renewal fail with
    /// [`SessionError::ExpirationOutOfRange`](crate::SessionError::ExpirationOutOfRange).
    pub session_window: Duration,

    /// Replace the update token as well on every renewal.
    ///
    /// Default: `false`, update tokens are stable for the life of the
    /// record and never expire.
    pub rotate_update_token: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_window: Duration::days(1),
            rotate_update_token: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialRecord
// ---------------------------------------------------------------------------

/// The stored credentials of one user.
///
/// Created exactly once per identity key, on first sign-in. Renewal mutates
/// the session fields; nothing deletes a record.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Stable identity from the identity provider. Unique.
    pub identity_key: IdentityKey,

    /// Short-lived bearer credential presented on every protected request.
    /// Unique across all records.
    pub session_token: String,

    /// Absolute instant after which `session_token` is rejected.
    pub session_expiration: DateTime<Utc>,

    /// Long-lived bearer credential, presented only to renew.
    /// Unique across all records.
    pub update_token: String,
}

impl CredentialRecord {
    /// Returns `true` if the session token is still accepted at `now`.
    ///
    /// The expiration instant itself is already outside the window.
    pub fn is_session_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.session_expiration
    }

    /// Converts to the wire triple handed back to clients.
    pub fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            session_token: self.session_token.clone(),
            session_expiration: self.session_expiration.to_rfc3339(),
            update_token: self.update_token.clone(),
        }
    }
}

/// Tokens are bearer secrets; keep them out of `{:?}` output and logs.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("identity_key", &self.identity_key)
            .field("session_token", &"<redacted>")
            .field("session_expiration", &self.session_expiration)
            .field("update_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record_expiring_at(expiration: DateTime<Utc>) -> CredentialRecord {
        CredentialRecord {
            identity_key: IdentityKey::new("u1"),
            session_token: "session-secret".into(),
            session_expiration: expiration,
            update_token: "update-secret".into(),
        }
    }

    #[test]
    fn test_is_session_valid_at_boundary_is_exclusive() {
        let exp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = record_expiring_at(exp);

        assert!(record.is_session_valid_at(exp - Duration::seconds(1)));
        assert!(!record.is_session_valid_at(exp));
        assert!(!record.is_session_valid_at(exp + Duration::seconds(1)));
    }

    #[test]
    fn test_to_payload_formats_expiration_as_rfc3339() {
        let exp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let payload = record_expiring_at(exp).to_payload();

        assert_eq!(payload.session_token, "session-secret");
        assert_eq!(payload.update_token, "update-secret");
        assert_eq!(payload.session_expiration, "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let exp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let printed = format!("{:?}", record_expiring_at(exp));

        assert!(printed.contains("u1"));
        assert!(!printed.contains("session-secret"));
        assert!(!printed.contains("update-secret"));
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.session_window, Duration::days(1));
        assert!(!config.rotate_update_token);
    }
}
