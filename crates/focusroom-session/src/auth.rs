//! Identity verification hook for sign-in.
//!
//! Focusroom doesn't verify OAuth ID tokens itself. That is the identity
//! provider's job (Google Sign-In, for example). This crate defines
//! the [`IdentityVerifier`] trait instead: one async method that takes the
//! assertion a client got from the provider and returns the stable subject
//! it names.
//!
//! # Why a trait?
//!
//! - Verify real provider tokens in production
//! - Use a fixed table of assertions in development and tests
//!
//! without touching the session layer.

use std::collections::HashMap;
use std::future::Future;

use focusroom_protocol::IdentityKey;

use crate::SessionError;

/// Validates an identity-provider assertion and returns the subject.
///
/// # Example
///
/// ```rust
/// use focusroom_protocol::IdentityKey;
/// use focusroom_session::{IdentityVerifier, SessionError};
///
/// /// Accepts `"dev:<name>"` and uses `<name>` as the subject.
/// /// Only for local development!
/// struct DevVerifier;
///
/// impl IdentityVerifier for DevVerifier {
///     async fn verify_identity(
///         &self,
///         assertion: &str,
///     ) -> Result<IdentityKey, SessionError> {
///         assertion
///             .strip_prefix("dev:")
///             .filter(|name| !name.is_empty())
///             .map(IdentityKey::new)
///             .ok_or_else(|| {
///                 SessionError::IdentityAssertionInvalid("expected dev:<name>".into())
///             })
///     }
/// }
/// ```
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Checks `assertion` with the identity provider.
    ///
    /// # Returns
    /// - `Ok(IdentityKey)`: the provider vouches for this subject
    /// - `Err(SessionError::IdentityAssertionInvalid)`: forged, expired,
    ///   or issued for another client
    fn verify_identity(
        &self,
        assertion: &str,
    ) -> impl Future<Output = Result<IdentityKey, SessionError>> + Send;
}

/// An [`IdentityVerifier`] backed by a fixed assertion → subject table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityVerifier {
    subjects: HashMap<String, IdentityKey>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an assertion that verifies as `subject`.
    pub fn with(mut self, assertion: impl Into<String>, subject: impl Into<String>) -> Self {
        self.insert(assertion, subject);
        self
    }

    pub fn insert(&mut self, assertion: impl Into<String>, subject: impl Into<String>) {
        self.subjects
            .insert(assertion.into(), IdentityKey::new(subject));
    }
}

impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify_identity(
        &self,
        assertion: &str,
    ) -> Result<IdentityKey, SessionError> {
        self.subjects.get(assertion).cloned().ok_or_else(|| {
            SessionError::IdentityAssertionInvalid("unrecognized identity assertion".into())
        })
    }
}
