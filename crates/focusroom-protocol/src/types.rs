//! Core wire types: identities, the response envelope, and body DTOs.
//!
//! Every type here is flat: strings, numbers, booleans, lists. Timestamps
//! travel as RFC 3339 strings so clients in any language can parse them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The stable subject identifier issued by the external identity provider.
///
/// Newtype over `String` so an identity key can't be confused with a room
/// code or a token at a call site. `#[serde(transparent)]` keeps it a plain
/// JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wraps an identity-provider subject.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrows the raw subject string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-chosen code that names a room, e.g. `"deep-work"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The shape of every response body.
///
/// ```text
/// { "success": true,  "data": { ... } }
/// { "success": false, "error": "Room invalid" }
/// ```
///
/// Exactly one of `data` / `error` is present. The HTTP-equivalent status
/// code travels next to the envelope, not inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// A successful response carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response carrying a user-visible message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// The credential triple returned by sign-in and renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session_token: String,
    /// RFC 3339 timestamp after which `session_token` is rejected.
    pub session_expiration: String,
    pub update_token: String,
}

/// What a client needs to connect to the video provider for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectInfo {
    /// The provider API key (public half of the provider credentials).
    pub key: String,
    pub video_session_id: String,
    /// Provider token, valid until the room's timed sessions are over.
    pub token: String,
}

/// Public view of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub video_session_id: String,
    pub num_sessions: u32,
    /// Seconds.
    pub work_length: u32,
    /// Seconds.
    pub break_length: u32,
    pub paused: bool,
    pub members: Vec<IdentityKey>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// `POST /signin/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    /// The identity provider's signed assertion.
    pub id_token: String,
}

/// `POST /rooms/` body.
///
/// Every field is optional at the wire level so a missing field can be
/// reported with a specific message instead of a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub num_sessions: Option<u32>,
    #[serde(default)]
    pub work_length: Option<u32>,
    #[serde(default)]
    pub break_length: Option<u32>,
}

/// `POST /join/` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub code: String,
}

// =========================================================================
// Tests
// =========================================================================
