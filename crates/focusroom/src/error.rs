//! Unified error type for Focusroom.

use focusroom_protocol::ProtocolError;
use focusroom_room::RoomError;
use focusroom_session::{SessionError, StoreError};
use http::StatusCode;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `focusroom` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant auto-generates `From` impls, so the `?` operator
/// converts sub-crate errors automatically.
///
/// [`status`](Self::status) and [`public_message`](Self::public_message)
/// are what a caller sees. The `Display` text is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum FocusroomError {
    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An authentication or credential failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Missing or unparsable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for FocusroomError {
    fn from(err: StoreError) -> Self {
        Self::Session(SessionError::Store(err))
    }
}

impl FocusroomError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(e) => match e {
                SessionError::MissingHeader
                | SessionError::MalformedHeader
                | SessionError::InvalidUpdateToken
                | SessionError::ExpiredOrUnknownSessionToken
                | SessionError::IdentityAssertionInvalid(_) => StatusCode::UNAUTHORIZED,
                SessionError::ExpirationOutOfRange | SessionError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Room(e) => match e {
                RoomError::NotFound(_) => StatusCode::NOT_FOUND,
                RoomError::AlreadyExists(_) => StatusCode::CONFLICT,
                RoomError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
                RoomError::Provider(_) | RoomError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Protocol(ProtocolError::Decode(_)) => StatusCode::BAD_REQUEST,
            Self::Protocol(ProtocolError::Encode(_)) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message placed in the failure envelope.
    ///
    /// Internal failures all read the same so nothing about the store or
    /// provider leaks to callers.
    pub fn public_message(&self) -> String {
        let msg = match self {
            Self::Session(e) => match e {
                SessionError::MissingHeader => "Missing authorization header",
                SessionError::MalformedHeader => "Invalid authorization header",
                SessionError::InvalidUpdateToken => "Invalid update token",
                SessionError::ExpiredOrUnknownSessionToken => "Session token expired.",
                SessionError::IdentityAssertionInvalid(_) => "User invalid",
                SessionError::ExpirationOutOfRange | SessionError::Store(_) => {
                    "Internal server error"
                }
            },
            Self::Room(e) => match e {
                RoomError::NotFound(_) => "Room invalid",
                RoomError::AlreadyExists(_) => "Room code already in use",
                RoomError::InvalidParameters(msg) => return msg.clone(),
                RoomError::Provider(_) | RoomError::Internal(_) => "Internal server error",
            },
            Self::Protocol(ProtocolError::Decode(_)) => "Invalid request body",
            Self::Protocol(ProtocolError::Encode(_)) | Self::Config(_) => {
                "Internal server error"
            }
        };
        msg.to_string()
    }

    /// `true` for failures that are the server's fault rather than the
    /// caller's.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}
