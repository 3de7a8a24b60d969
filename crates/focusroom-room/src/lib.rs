//! Room lifecycle management for Focusroom.
//!
//! A room is a shared run of timed work/break periods bound to one
//! video-provider session. Members get a provider token that stays valid
//! for the whole run.
//!
//! # Key types
//!
//! - [`VideoProvider`]: the seam to the hosted video service
//! - [`RoomManager`]: creates, pauses, deletes rooms and lets users join
//! - [`Room`]: one room's record
//! - [`NewRoom`]: unvalidated creation parameters
//! - [`RoomManagerConfig`]: limits applied at creation

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod manager;
mod provider;
mod room;

pub use config::RoomManagerConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use provider::{LocalVideoProvider, VideoProvider, VideoSessionId};
pub use room::{NewRoom, Room, RoomConnection};
