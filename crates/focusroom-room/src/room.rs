//! Room records and creation parameters.

use chrono::{DateTime, Duration, Utc};
use focusroom_protocol::{CreateRoomRequest, IdentityKey, RoomCode, RoomView};

use crate::{RoomError, RoomManagerConfig, VideoSessionId};

/// One room: a run of `num_sessions` work/break cycles on a shared
/// provider session.
///
/// Lengths are in seconds. Rooms only come out of
/// [`RoomManager`](crate::RoomManager), which validates them, so
/// [`room_length`](Self::room_length) always fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub code: RoomCode,
    pub video_session_id: VideoSessionId,
    pub num_sessions: u32,
    pub work_length: u32,
    pub break_length: u32,
    pub paused: bool,
    /// Creator first, then joiners in join order. No duplicates.
    pub members: Vec<IdentityKey>,
}

impl Room {
    /// Total run time: `num_sessions * (work_length + break_length)`.
    pub fn room_length(&self) -> Duration {
        let secs = self
            .work_length
            .saturating_add(self.break_length)
            .saturating_mul(self.num_sessions);
        Duration::seconds(i64::from(secs))
    }

    pub fn is_member(&self, identity_key: &IdentityKey) -> bool {
        self.members.contains(identity_key)
    }

    /// Adds `identity_key` unless it is already a member. Returns `true`
    /// if it was added.
    pub(crate) fn add_member(&mut self, identity_key: IdentityKey) -> bool {
        if self.is_member(&identity_key) {
            return false;
        }
        self.members.push(identity_key);
        true
    }

    pub fn to_view(&self) -> RoomView {
        RoomView {
            code: self.code.clone(),
            video_session_id: self.video_session_id.as_str().to_string(),
            num_sessions: self.num_sessions,
            work_length: self.work_length,
            break_length: self.break_length,
            paused: self.paused,
            members: self.members.clone(),
        }
    }
}

/// What a member needs to connect to a room's video session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConnection {
    pub video_session_id: VideoSessionId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Room creation parameters as the caller sent them.
///
/// Every field is optional here; [`validate`](Self::validate) decides what
/// is actually acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRoom {
    pub code: Option<String>,
    pub num_sessions: Option<u32>,
    pub work_length: Option<u32>,
    pub break_length: Option<u32>,
}

/// Parameters that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidRoom {
    pub code: RoomCode,
    pub num_sessions: u32,
    pub work_length: u32,
    pub break_length: u32,
    pub room_length: Duration,
}

impl NewRoom {
    pub fn new(code: impl Into<String>, num_sessions: u32, work_length: u32, break_length: u32) -> Self {
        Self {
            code: Some(code.into()),
            num_sessions: Some(num_sessions),
            work_length: Some(work_length),
            break_length: Some(break_length),
        }
    }

    /// Checks the parameters against `config`.
    ///
    /// # Errors
    /// [`RoomError::InvalidParameters`] with a message fit for the caller:
    /// - missing or blank code, or a code longer than `max_code_len`
    /// - missing `num_sessions` / `work_length` / `break_length`
    /// - zero sessions or a zero-length work period
    /// - a total length that does not fit in `u32` seconds
    pub(crate) fn validate(&self, config: &RoomManagerConfig) -> Result<ValidRoom, RoomError> {
        let invalid = |msg: &str| RoomError::InvalidParameters(msg.to_string());

        let code = self
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid("Must enter a room code"))?;
        if code.chars().count() > config.max_code_len {
            return Err(RoomError::InvalidParameters(format!(
                "Room code must be at most {} characters",
                config.max_code_len
            )));
        }

        let num_sessions = self
            .num_sessions
            .ok_or_else(|| invalid("Must enter number of sessions"))?;
        let work_length = self
            .work_length
            .ok_or_else(|| invalid("Must enter length of work periods"))?;
        let break_length = self
            .break_length
            .ok_or_else(|| invalid("Must enter length of break periods"))?;

        if num_sessions == 0 {
            return Err(invalid("Must have at least one session"));
        }
        if work_length == 0 {
            return Err(invalid("Work periods must be at least one second"));
        }

        let total = work_length
            .checked_add(break_length)
            .and_then(|cycle| cycle.checked_mul(num_sessions))
            .ok_or_else(|| invalid("Room is too long"))?;

        Ok(ValidRoom {
            code: RoomCode::new(code),
            num_sessions,
            work_length,
            break_length,
            room_length: Duration::seconds(i64::from(total)),
        })
    }
}

impl From<CreateRoomRequest> for NewRoom {
    fn from(req: CreateRoomRequest) -> Self {
        Self {
            code: req.code,
            num_sessions: req.num_sessions,
            work_length: req.work_length,
            break_length: req.break_length,
        }
    }
}
