//! # Focusroom
//!
//! Session tokens and shared work/break rooms on top of a hosted video
//! provider.
//!
//! Users sign in with an identity-provider assertion and get a pair of
//! bearer tokens: a short-lived session token for every protected call and
//! a long-lived update token for minting the next session token. Signed-in
//! users create and join rooms; each room is one video-provider session
//! that runs `num_sessions` work/break cycles.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use focusroom::prelude::*;
//!
//! # async fn run() -> Result<(), FocusroomError> {
//! let config = FocusroomConfig::from_env()?;
//! init_tracing(&config.log)?;
//!
//! let verifier = StaticIdentityVerifier::new().with("dev-assertion", "dev-user");
//! let service = Focusroom::connect(&config, verifier, LocalVideoProvider::new()).await?;
//!
//! let response = service
//!     .sign_in(SignInRequest { id_token: "dev-assertion".into() })
//!     .await;
//! assert_eq!(response.status, http::StatusCode::CREATED);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod service;
pub mod telemetry;

pub use config::{FocusroomConfig, LogConfig, LogFormat};
pub use error::FocusroomError;
pub use service::{ApiResponse, Focusroom};
pub use telemetry::init_tracing;

pub use focusroom_protocol as protocol;
pub use focusroom_room as room;
pub use focusroom_session as session;

/// Everything needed to stand up and call a [`Focusroom`].
pub mod prelude {
    pub use crate::{
        ApiResponse, Focusroom, FocusroomConfig, FocusroomError, LogConfig, LogFormat,
        init_tracing,
    };
    pub use focusroom_protocol::{
        ConnectInfo, CreateRoomRequest, Envelope, IdentityKey, JoinRoomRequest, RoomCode,
        RoomView, SessionPayload, SignInRequest,
    };
    pub use focusroom_room::{LocalVideoProvider, RoomManager, RoomManagerConfig, VideoProvider};
    pub use focusroom_session::{
        BearerGuard, IdentityVerifier, MemoryCredentialStore, SessionConfig, SessionManager,
        SqliteCredentialStore, StaticIdentityVerifier,
    };
}
