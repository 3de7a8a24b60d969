//! The `Focusroom` service facade.
//!
//! This is the entry point for every inbound operation. It ties together
//! the layers: protocol bodies → session guard → room manager. Whatever
//! routing layer sits in front (an HTTP framework, a test harness, the
//! walkthrough demo) hands over headers and typed bodies and gets back an
//! [`ApiResponse`]: a status plus the `{success, data | error}` envelope.
//!
//! Nothing here panics on bad input. Every failure is a
//! [`FocusroomError`] rendered through
//! [`status`](FocusroomError::status) and
//! [`public_message`](FocusroomError::public_message).

use std::sync::Arc;

use focusroom_protocol::{
    Codec, ConnectInfo, CreateRoomRequest, Envelope, JoinRoomRequest, JsonCodec, ProtocolError,
    RoomCode, RoomView, SessionPayload, SignInRequest,
};
use focusroom_room::{NewRoom, RoomConnection, RoomManager, VideoProvider};
use focusroom_session::{
    BearerGuard, Clock, CredentialStore, IdentityVerifier, SessionError, SessionManager,
    SqliteCredentialStore, SystemClock, extract_bearer,
};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{FocusroomConfig, FocusroomError};

// ---------------------------------------------------------------------------
// ApiResponse
// ---------------------------------------------------------------------------

/// A status code plus the response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Envelope<serde_json::Value>,
}

impl ApiResponse {
    fn success<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status,
                body: Envelope::success(value),
            },
            Err(e) => Self::failure(&FocusroomError::from(ProtocolError::Encode(e))),
        }
    }

    /// Renders `err` as a failure envelope. Internal failures are logged
    /// here, once, with their full detail.
    pub fn failure(err: &FocusroomError) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, "request rejected");
        }
        Self {
            status: err.status(),
            body: Envelope::failure(err.public_message()),
        }
    }

    fn from_result<T: Serialize>(
        status: StatusCode,
        result: Result<T, FocusroomError>,
    ) -> Self {
        match result {
            Ok(data) => Self::success(status, &data),
            Err(e) => Self::failure(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }

    /// Encodes the envelope for the wire.
    pub fn encode(&self, codec: &impl Codec) -> Result<Vec<u8>, FocusroomError> {
        Ok(codec.encode(&self.body)?)
    }
}

// ---------------------------------------------------------------------------
// Focusroom
// ---------------------------------------------------------------------------

/// Shared service state: credentials, identity verification, and rooms.
///
/// `Send + Sync`; wrap it in an `Arc` and clone that into request tasks.
/// Nothing here takes a lock of its own: credentials rely on the store's
/// atomicity and rooms on [`RoomManager`]'s table lock, which is never held
/// while the video provider is called.
pub struct Focusroom<S, I, V, C = SystemClock> {
    sessions: Arc<SessionManager<S, C>>,
    guard: BearerGuard<S, C>,
    verifier: I,
    rooms: RoomManager<V, C>,
    provider_api_key: String,
    codec: JsonCodec,
}

impl<S, I, V> Focusroom<S, I, V>
where
    S: CredentialStore,
    I: IdentityVerifier,
    V: VideoProvider,
{
    /// Builds a service over `store` using `config`'s session and room
    /// settings and the system clock.
    pub fn from_config(config: &FocusroomConfig, store: S, verifier: I, provider: V) -> Self {
        Self::new(
            SessionManager::new(store, config.session.clone()),
            verifier,
            RoomManager::new(provider, config.rooms.clone()),
            config.provider_api_key.clone(),
        )
    }
}

impl<I, V> Focusroom<SqliteCredentialStore, I, V>
where
    I: IdentityVerifier,
    V: VideoProvider,
{
    /// Opens the SQLite database at `config.database_url` and builds the
    /// service on it.
    pub async fn connect(
        config: &FocusroomConfig,
        verifier: I,
        provider: V,
    ) -> Result<Self, FocusroomError> {
        let store = SqliteCredentialStore::connect(&config.database_url).await?;
        Ok(Self::from_config(config, store, verifier, provider))
    }
}

impl<S, I, V, C> Focusroom<S, I, V, C>
where
    S: CredentialStore,
    I: IdentityVerifier,
    V: VideoProvider,
    C: Clock,
{
    /// Assembles a service from already-built managers.
    pub fn new(
        sessions: SessionManager<S, C>,
        verifier: I,
        rooms: RoomManager<V, C>,
        provider_api_key: impl Into<String>,
    ) -> Self {
        let sessions = Arc::new(sessions);
        Self {
            guard: BearerGuard::new(Arc::clone(&sessions)),
            sessions,
            verifier,
            rooms,
            provider_api_key: provider_api_key.into(),
            codec: JsonCodec,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager<S, C>> {
        &self.sessions
    }

    pub fn guard(&self) -> &BearerGuard<S, C> {
        &self.guard
    }

    pub fn rooms(&self) -> &RoomManager<V, C> {
        &self.rooms
    }

    /// Decodes a request body with the service's codec.
    ///
    /// # Errors
    /// [`FocusroomError::Protocol`], reported as 400.
    pub fn decode_body<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, FocusroomError> {
        Ok(self.codec.decode(body)?)
    }

    /// Encodes a response for the wire.
    pub fn encode_response(&self, response: &ApiResponse) -> Result<Vec<u8>, FocusroomError> {
        response.encode(&self.codec)
    }

    // -- credentials ------------------------------------------------------

    /// Verifies the identity assertion and returns the user's credentials,
    /// creating them on first sign-in. 201.
    pub async fn sign_in(&self, req: SignInRequest) -> ApiResponse {
        ApiResponse::from_result(StatusCode::CREATED, self.try_sign_in(req).await)
    }

    /// Mints a new session token for the update token in the `Authorization`
    /// header. 201.
    pub async fn renew_session(&self, headers: &HeaderMap) -> ApiResponse {
        ApiResponse::from_result(StatusCode::CREATED, self.try_renew(headers).await)
    }

    // -- rooms ------------------------------------------------------------

    /// All rooms, sorted by code. 200.
    pub async fn list_rooms(&self) -> ApiResponse {
        let result = self
            .rooms
            .list_rooms()
            .map(|rooms| rooms.iter().map(|r| r.to_view()).collect::<Vec<RoomView>>())
            .map_err(FocusroomError::from);
        ApiResponse::from_result(StatusCode::OK, result)
    }

    /// One room. 200, or 404 for an unknown code.
    pub async fn get_room(&self, code: &str) -> ApiResponse {
        let result = self
            .rooms
            .get_room(&RoomCode::new(code))
            .map(|room| room.to_view())
            .map_err(FocusroomError::from);
        ApiResponse::from_result(StatusCode::OK, result)
    }

    /// Creates a room with the caller as its first member. 201.
    pub async fn create_room(&self, headers: &HeaderMap, req: CreateRoomRequest) -> ApiResponse {
        ApiResponse::from_result(StatusCode::CREATED, self.try_create_room(headers, req).await)
    }

    /// Flips a room between paused and running. 200.
    ///
    /// Needs no session token; any client that knows the code may pause.
    pub async fn toggle_pause(&self, code: &str) -> ApiResponse {
        let result = self
            .rooms
            .toggle_pause(&RoomCode::new(code))
            .map(|room| room.to_view())
            .map_err(FocusroomError::from);
        ApiResponse::from_result(StatusCode::OK, result)
    }

    /// Deletes a room and returns it as it was. 200.
    pub async fn delete_room(&self, headers: &HeaderMap, code: &str) -> ApiResponse {
        ApiResponse::from_result(StatusCode::OK, self.try_delete_room(headers, code).await)
    }

    /// Adds the caller to a room and returns their connection details. 200.
    pub async fn join_room(&self, headers: &HeaderMap, req: JoinRoomRequest) -> ApiResponse {
        ApiResponse::from_result(StatusCode::OK, self.try_join_room(headers, req).await)
    }

    // -- fallible bodies ---------------------------------------------------

    async fn try_sign_in(&self, req: SignInRequest) -> Result<SessionPayload, FocusroomError> {
        if req.id_token.trim().is_empty() {
            return Err(SessionError::IdentityAssertionInvalid("empty id_token".into()).into());
        }
        let record = self.sessions.sign_in(&self.verifier, &req.id_token).await?;
        Ok(record.to_payload())
    }

    async fn try_renew(&self, headers: &HeaderMap) -> Result<SessionPayload, FocusroomError> {
        let update_token = extract_bearer(headers)?;
        let record = self.sessions.renew(&update_token).await?;
        Ok(record.to_payload())
    }

    async fn try_create_room(
        &self,
        headers: &HeaderMap,
        req: CreateRoomRequest,
    ) -> Result<ConnectInfo, FocusroomError> {
        let caller = self.guard.authenticate(headers).await?;
        let (_, conn) = self
            .rooms
            .create_room(caller.identity_key, NewRoom::from(req))
            .await?;
        Ok(self.connect_info(conn))
    }

    async fn try_delete_room(
        &self,
        headers: &HeaderMap,
        code: &str,
    ) -> Result<RoomView, FocusroomError> {
        if !self.guard.authorize(headers).await {
            return Err(rejection(headers).into());
        }
        let room = self.rooms.delete_room(&RoomCode::new(code))?;
        Ok(room.to_view())
    }

    async fn try_join_room(
        &self,
        headers: &HeaderMap,
        req: JoinRoomRequest,
    ) -> Result<ConnectInfo, FocusroomError> {
        let caller = self.guard.authenticate(headers).await?;
        let conn = self
            .rooms
            .join_room(&RoomCode::new(req.code), caller.identity_key)
            .await?;
        Ok(self.connect_info(conn))
    }

    fn connect_info(&self, conn: RoomConnection) -> ConnectInfo {
        ConnectInfo {
            key: self.provider_api_key.clone(),
            video_session_id: conn.video_session_id.as_str().to_string(),
            token: conn.token,
        }
    }
}

/// Why `authorize` said no: the extraction error if there was one,
/// otherwise an expired or unknown token.
fn rejection(headers: &HeaderMap) -> SessionError {
    match extract_bearer(headers) {
        Err(e) => e,
        Ok(_) => SessionError::ExpiredOrUnknownSessionToken,
    }
}
