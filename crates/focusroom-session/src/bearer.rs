//! Bearer-token extraction and the authorization guard.

use std::sync::Arc;

use http::HeaderMap;
use http::header::AUTHORIZATION;

use crate::{Clock, CredentialRecord, CredentialStore, SessionError, SessionManager, SystemClock};

/// Pulls the bearer token out of the `Authorization` header.
///
/// - no header → [`SessionError::MissingHeader`]
/// - header that is empty once `"Bearer "` is stripped and whitespace
///   trimmed, or that isn't visible ASCII → [`SessionError::MalformedHeader`]
///
/// A value without the `Bearer ` prefix is taken as the token itself, which
/// is what existing clients rely on.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, SessionError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(SessionError::MissingHeader)?;
    let raw = value
        .to_str()
        .map_err(|_| SessionError::MalformedHeader)?
        .trim();

    if raw.eq_ignore_ascii_case("bearer") {
        return Err(SessionError::MalformedHeader);
    }

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(SessionError::MalformedHeader);
    }
    Ok(token.to_string())
}

/// Guards protected operations behind a valid session token.
///
/// Read-only: checking a request never changes stored credentials. Callers
/// turn a `false` / `Err` into an access-denied response themselves.
pub struct BearerGuard<S, C = SystemClock> {
    sessions: Arc<SessionManager<S, C>>,
}

impl<S, C> Clone for BearerGuard<S, C> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<S: CredentialStore, C: Clock> BearerGuard<S, C> {
    pub fn new(sessions: Arc<SessionManager<S, C>>) -> Self {
        Self { sessions }
    }

    /// `true` if the request carries a known, unexpired session token.
    pub async fn authorize(&self, headers: &HeaderMap) -> bool {
        match extract_bearer(headers) {
            Ok(token) => self.sessions.verify(&token).await,
            Err(e) => {
                tracing::debug!(error = %e, "authorization rejected");
                false
            }
        }
    }

    /// Like [`authorize`](Self::authorize), but returns whose session it is.
    ///
    /// # Errors
    /// Any extraction error, [`SessionError::ExpiredOrUnknownSessionToken`],
    /// or a store failure.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<CredentialRecord, SessionError> {
        let token = extract_bearer(headers)?;
        self.sessions.resolve(&token).await
    }
}
