//! Session tokens and bearer authorization for Focusroom.
//!
//! This crate owns the credential lifecycle of a user:
//!
//! 1. **Sign-in**: an identity assertion is checked by an
//!    [`IdentityVerifier`], then [`SessionManager::create_or_get_user`]
//!    issues (or returns the existing) [`CredentialRecord`].
//! 2. **Verification**: every protected request carries the session token
//!    in an `Authorization: Bearer` header; [`BearerGuard`] extracts it and
//!    asks the manager whether it is known and unexpired.
//! 3. **Renewal**: the long-lived update token mints a fresh session token
//!    through [`SessionManager::renew`], no identity round-trip needed.
//!
//! # How it fits in the stack
//!
//! ```text
//! Service facade (above)  ← maps results to {success, data | error}
//!     ↕
//! Session layer (this crate)  ← tokens, expiry, bearer checks
//!     ↕
//! CredentialStore (below)  ← memory or SQLite, atomic per operation
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod bearer;
mod clock;
mod error;
mod manager;
mod record;
mod store;
mod token;

pub use auth::{IdentityVerifier, StaticIdentityVerifier};
pub use bearer::{BearerGuard, extract_bearer};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SessionError, StoreError};
pub use manager::SessionManager;
pub use record::{CredentialRecord, MAX_SESSION_WINDOW_SECS, SessionConfig};
#[cfg(feature = "sqlite")]
pub use store::SqliteCredentialStore;
pub use store::{CredentialStore, MemoryCredentialStore, SessionRotation};
pub use token::{TOKEN_LEN, generate_token};
