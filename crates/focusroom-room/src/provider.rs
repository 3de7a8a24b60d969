//! The `VideoProvider` trait: the seam to the hosted video service.
//!
//! Focusroom never carries audio or video itself. Each room is backed by
//! one provider session, and each member receives a provider token scoped
//! to that session. Production deployments implement this trait over the
//! provider's SDK or REST API; [`LocalVideoProvider`] stands in for it in
//! development and tests.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Identifier of a session on the video provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoSessionId(String);

impl VideoSessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hosted video service that rooms are built on.
///
/// Both methods may hit the network, so both are async. Failures are
/// reported as [`RoomError::Provider`].
pub trait VideoProvider: Send + Sync + 'static {
    /// Opens a new provider session for a room.
    fn create_session(&self) -> impl Future<Output = Result<VideoSessionId, RoomError>> + Send;

    /// Mints a client token for `session` that stops working at `expires_at`.
    fn generate_token(
        &self,
        session: &VideoSessionId,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<String, RoomError>> + Send;
}

/// A [`VideoProvider`] that never leaves the process.
///
/// Session ids are sequential (`local-1`, `local-2`, ...). Tokens are random
/// and carry no meaning for any real provider.
#[derive(Debug, Default)]
pub struct LocalVideoProvider {
    next_session: AtomicU64,
}

impl LocalVideoProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoProvider for LocalVideoProvider {
    async fn create_session(&self) -> Result<VideoSessionId, RoomError> {
        let n = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(VideoSessionId::new(format!("local-{n}")))
    }

    async fn generate_token(
        &self,
        _session: &VideoSessionId,
        _expires_at: DateTime<Utc>,
    ) -> Result<String, RoomError> {
        Ok(focusroom_session::generate_token())
    }
}
