//! Error types for the session layer.

/// Errors that can occur while issuing, renewing, or checking credentials.
///
/// Every variant is recoverable: the facade turns it into a rejection.
/// Unknown and expired session tokens share one variant so a caller can't
/// tell which case it hit.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request carries no `Authorization` header.
    #[error("missing authorization header")]
    MissingHeader,

    /// The `Authorization` header is present but holds no usable token
    /// once the `Bearer ` prefix is stripped.
    #[error("invalid authorization header")]
    MalformedHeader,

    /// No credential record has this update token.
    #[error("invalid update token")]
    InvalidUpdateToken,

    /// The session token is unknown, or known but past its expiration.
    #[error("session token expired or unknown")]
    ExpiredOrUnknownSessionToken,

    /// The identity provider rejected the assertion.
    #[error("identity assertion invalid: {0}")]
    IdentityAssertionInvalid(String),

    /// `now + session_window` is not a representable timestamp, or the
    /// window exceeds [`MAX_SESSION_WINDOW_SECS`](crate::MAX_SESSION_WINDOW_SECS).
    #[error("session expiration out of range")]
    ExpirationOutOfRange,

    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by a [`CredentialStore`](crate::CredentialStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint (identity key, session token, or update
    /// token) would be violated.
    #[error("credential conflict: {0}")]
    Conflict(String),

    /// The backing store failed for a reason unrelated to the data.
    #[error("credential store failure: {0}")]
    Backend(String),

    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlx(#[from] sqlx::Error),
}
