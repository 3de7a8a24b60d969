//! Wire types for Focusroom.
//!
//! This crate defines what crosses the service boundary:
//!
//! - **Identity types** ([`IdentityKey`], [`RoomCode`]) shared by every layer.
//! - **Envelope** ([`Envelope`]): the `{success, data | error}` shape every
//!   response is wrapped in.
//! - **Bodies** ([`SessionPayload`], [`RoomView`], [`ConnectInfo`], and the
//!   request structs): flat DTOs made of strings and numbers only. Internal
//!   records never travel on the wire; they are converted to these first.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! ```text
//! Routing layer (bytes) → Protocol (bodies, Envelope) → Session / Room
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ConnectInfo, CreateRoomRequest, Envelope, IdentityKey, JoinRoomRequest,
    RoomCode, RoomView, SessionPayload, SignInRequest,
};
