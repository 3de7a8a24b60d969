//! Room manager: creates, tracks, and admits members to rooms.
//!
//! The room table sits behind a `std::sync::RwLock` that is only ever held
//! for map work, never across a provider call. Creating a room therefore
//! runs in three steps:
//!
//! ```text
//! lock: code free? ──→ reserve code ──→ unlock
//!                                          │
//!                 provider: create_session + generate_token
//!                                          │
//! lock: insert room, release reservation ◄─┘   (failure/cancel: release only)
//! ```
//!
//! While a code is reserved, a second `create_room` for it reports
//! [`RoomError::AlreadyExists`] and lookups don't see it yet.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use focusroom_protocol::{IdentityKey, RoomCode};
use focusroom_session::{Clock, SystemClock};

use crate::room::ValidRoom;
use crate::{NewRoom, Room, RoomConnection, RoomError, RoomManagerConfig, VideoProvider};

#[derive(Debug, Default)]
struct RoomTable {
    /// Keyed by code; iteration order is the listing order.
    rooms: BTreeMap<RoomCode, Room>,
    /// Codes whose provider session is still being opened.
    reserved: BTreeSet<RoomCode>,
}

fn poisoned<T>(_: PoisonError<T>) -> RoomError {
    RoomError::Internal("room table lock poisoned".into())
}

/// A code held for an in-flight `create_room`. Dropping it without
/// [`commit`](Self::commit) frees the code again.
struct Reservation<'a> {
    table: &'a RwLock<RoomTable>,
    code: RoomCode,
    committed: bool,
}

impl Reservation<'_> {
    fn commit(mut self, room: Room) -> Result<(), RoomError> {
        let lock = self.table;
        let mut table = lock.write().map_err(poisoned)?;
        table.reserved.remove(&self.code);
        table.rooms.insert(self.code.clone(), room);
        self.committed = true;
        Ok(())
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Ok(mut table) = self.table.write() {
            table.reserved.remove(&self.code);
        }
        tracing::debug!(code = %self.code, "room code reservation released");
    }
}

/// Owns every room and the video provider they are built on.
///
/// All operations take `&self`; share the manager behind an `Arc`. A slow
/// provider call only delays the request that made it.
pub struct RoomManager<V, C = SystemClock> {
    table: RwLock<RoomTable>,
    provider: V,
    clock: C,
    config: RoomManagerConfig,
}

impl<V: VideoProvider> RoomManager<V> {
    /// Creates an empty manager on the system clock.
    pub fn new(provider: V, config: RoomManagerConfig) -> Self {
        Self::with_clock(provider, config, SystemClock)
    }
}

impl<V: VideoProvider, C: Clock> RoomManager<V, C> {
    /// Creates an empty manager that reads time from `clock`.
    pub fn with_clock(provider: V, config: RoomManagerConfig, clock: C) -> Self {
        Self {
            table: RwLock::new(RoomTable::default()),
            provider,
            clock,
            config,
        }
    }

    pub fn provider(&self) -> &V {
        &self.provider
    }

    pub fn config(&self) -> &RoomManagerConfig {
        &self.config
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RoomTable>, RoomError> {
        self.table.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RoomTable>, RoomError> {
        self.table.write().map_err(poisoned)
    }

    fn reserve(&self, code: &RoomCode) -> Result<Reservation<'_>, RoomError> {
        let mut table = self.write()?;
        if table.rooms.contains_key(code) || table.reserved.contains(code) {
            return Err(RoomError::AlreadyExists(code.clone()));
        }
        table.reserved.insert(code.clone());
        Ok(Reservation {
            table: &self.table,
            code: code.clone(),
            committed: false,
        })
    }

    fn expiry(&self, room_length: Duration) -> Result<DateTime<Utc>, RoomError> {
        self.clock
            .now()
            .checked_add_signed(room_length)
            .ok_or_else(|| RoomError::InvalidParameters("Room is too long".into()))
    }

    /// Validates `new`, opens a provider session, and records `creator` as
    /// the first member.
    ///
    /// The creator's token expires when the whole run would end:
    /// `now + room_length`.
    ///
    /// # Errors
    /// - [`RoomError::InvalidParameters`] if `new` fails validation
    /// - [`RoomError::AlreadyExists`] if the code is taken or reserved
    /// - [`RoomError::Provider`] if the provider call fails; no room is
    ///   recorded in that case and the code is free again
    pub async fn create_room(
        &self,
        creator: IdentityKey,
        new: NewRoom,
    ) -> Result<(Room, RoomConnection), RoomError> {
        let ValidRoom {
            code,
            num_sessions,
            work_length,
            break_length,
            room_length,
        } = new.validate(&self.config)?;

        let reservation = self.reserve(&code)?;

        let video_session_id = self.provider.create_session().await.inspect_err(|e| {
            tracing::error!(%code, error = %e, "provider session creation failed");
        })?;
        let expires_at = self.expiry(room_length)?;
        let token = self
            .provider
            .generate_token(&video_session_id, expires_at)
            .await
            .inspect_err(|e| {
                tracing::error!(%code, error = %e, "provider token generation failed");
            })?;

        let room = Room {
            code: code.clone(),
            video_session_id: video_session_id.clone(),
            num_sessions,
            work_length,
            break_length,
            paused: false,
            members: vec![creator.clone()],
        };
        reservation.commit(room.clone())?;

        tracing::info!(%code, %creator, %video_session_id, "room created");
        Ok((
            room,
            RoomConnection {
                video_session_id,
                token,
                expires_at,
            },
        ))
    }

    /// Looks up a room by code.
    pub fn get_room(&self, code: &RoomCode) -> Result<Room, RoomError> {
        self.read()?
            .rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// All rooms, sorted by code.
    pub fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        Ok(self.read()?.rooms.values().cloned().collect())
    }

    /// Flips the room's `paused` flag and returns the updated room.
    pub fn toggle_pause(&self, code: &RoomCode) -> Result<Room, RoomError> {
        let mut table = self.write()?;
        let room = table
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.paused = !room.paused;

        tracing::info!(%code, paused = room.paused, "room pause toggled");
        Ok(room.clone())
    }

    /// Removes a room and returns it as it was just before removal.
    pub fn delete_room(&self, code: &RoomCode) -> Result<Room, RoomError> {
        let room = self
            .write()?
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        tracing::info!(%code, "room deleted");
        Ok(room)
    }

    /// Adds `member` to the room (once) and mints them a provider token.
    ///
    /// Joining twice is allowed and yields a fresh token each time; the
    /// member list is unchanged the second time.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if no room has `code`, including when the
    ///   room is deleted while the token is being minted
    /// - [`RoomError::Provider`] if the provider call fails
    pub async fn join_room(
        &self,
        code: &RoomCode,
        member: IdentityKey,
    ) -> Result<RoomConnection, RoomError> {
        let (video_session_id, room_length) = {
            let table = self.read()?;
            let room = table
                .rooms
                .get(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;
            (room.video_session_id.clone(), room.room_length())
        };

        let expires_at = self.expiry(room_length)?;
        let token = self
            .provider
            .generate_token(&video_session_id, expires_at)
            .await
            .inspect_err(|e| {
                tracing::error!(%code, error = %e, "provider token generation failed");
            })?;

        let mut table = self.write()?;
        let room = table
            .rooms
            .get_mut(code)
            .filter(|room| room.video_session_id == video_session_id)
            .ok_or_else(|| {
                tracing::debug!(%code, %member, "room went away during join");
                RoomError::NotFound(code.clone())
            })?;
        if room.add_member(member.clone()) {
            tracing::info!(%code, %member, "member joined room");
        } else {
            tracing::debug!(%code, %member, "member rejoined room");
        }

        Ok(RoomConnection {
            video_session_id,
            token,
            expires_at,
        })
    }

    /// Returns the number of rooms, not counting reserved codes.
    pub fn room_count(&self) -> Result<usize, RoomError> {
        Ok(self.read()?.rooms.len())
    }
}
