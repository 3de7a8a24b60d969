//! Error types for the room layer.

use focusroom_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Another room already uses this code.
    #[error("room {0} already exists")]
    AlreadyExists(RoomCode),

    /// Creation parameters were missing or out of range. The message is
    /// safe to show to the caller.
    #[error("{0}")]
    InvalidParameters(String),

    /// The video provider failed to create a session or mint a token.
    #[error("video provider error: {0}")]
    Provider(String),

    /// The room table is unusable, e.g. its lock was poisoned.
    #[error("room table failure: {0}")]
    Internal(String),
}
