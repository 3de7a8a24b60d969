//! Integration tests for the service facade: every inbound operation and
//! the status/envelope each failure maps to.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use focusroom::prelude::*;
use focusroom_session::ManualClock;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

type Service = Focusroom<MemoryCredentialStore, StaticIdentityVerifier, LocalVideoProvider, ManualClock>;

// =========================================================================
// Helpers
// =========================================================================

const PROVIDER_KEY: &str = "provider-key-1";

fn service() -> (Service, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap());
    let sessions = SessionManager::with_clock(
        MemoryCredentialStore::new(),
        SessionConfig {
            session_window: Duration::hours(1),
            rotate_update_token: false,
        },
        clock.clone(),
    );
    let rooms = RoomManager::with_clock(
        LocalVideoProvider::new(),
        RoomManagerConfig::default(),
        clock.clone(),
    );
    let verifier = StaticIdentityVerifier::new()
        .with("assert-alice", "alice")
        .with("assert-bob", "bob");

    (Focusroom::new(sessions, verifier, rooms, PROVIDER_KEY), clock)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

fn data<T: DeserializeOwned>(response: &ApiResponse) -> T {
    assert!(response.is_success(), "expected success, got {response:?}");
    serde_json::from_value(response.body.data.clone().unwrap()).unwrap()
}

fn error(response: &ApiResponse) -> &str {
    assert!(!response.is_success(), "expected failure, got {response:?}");
    assert!(response.body.data.is_none());
    response.body.error.as_deref().unwrap()
}

async fn sign_in(service: &Service, assertion: &str) -> SessionPayload {
    let response = service
        .sign_in(SignInRequest {
            id_token: assertion.into(),
        })
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    data(&response)
}

fn study_room(code: &str) -> CreateRoomRequest {
    CreateRoomRequest {
        code: Some(code.into()),
        num_sessions: Some(4),
        work_length: Some(1500),
        break_length: Some(300),
    }
}

// =========================================================================
// Sign-in and renewal
// =========================================================================

#[tokio::test]
async fn test_sign_in_returns_credentials() {
    let (service, _clock) = service();

    let payload = sign_in(&service, "assert-alice").await;

    assert_ne!(payload.session_token, payload.update_token);
    assert_eq!(payload.session_expiration, "2026-05-04T13:00:00+00:00");
}

#[tokio::test]
async fn test_sign_in_twice_returns_same_credentials() {
    let (service, _clock) = service();

    let first = sign_in(&service, "assert-alice").await;
    let second = sign_in(&service, "assert-alice").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sign_in_unknown_assertion_is_unauthorized() {
    let (service, _clock) = service();

    let response = service
        .sign_in(SignInRequest {
            id_token: "forged".into(),
        })
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&response), "User invalid");
}

#[tokio::test]
async fn test_sign_in_empty_assertion_is_unauthorized() {
    let (service, _clock) = service();

    let response = service
        .sign_in(SignInRequest {
            id_token: "  ".into(),
        })
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_unrepresentable_expiration_is_internal_error() {
    let (service, clock) = service();
    clock.set(chrono::DateTime::<Utc>::MAX_UTC);

    let response = service
        .sign_in(SignInRequest {
            id_token: "assert-alice".into(),
        })
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error(&response), "Internal server error");
    assert!(service.sessions().store().is_empty().await);
}

#[tokio::test]
async fn test_renew_session_issues_new_session_token() {
    let (service, clock) = service();
    let first = sign_in(&service, "assert-alice").await;
    clock.advance(Duration::minutes(30));

    let response = service.renew_session(&bearer(&first.update_token)).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let renewed: SessionPayload = data(&response);
    assert_ne!(renewed.session_token, first.session_token);
    assert_eq!(renewed.update_token, first.update_token);
    assert_eq!(renewed.session_expiration, "2026-05-04T13:30:00+00:00");
}

#[tokio::test]
async fn test_renew_session_header_failures() {
    let (service, _clock) = service();

    let missing = service.renew_session(&HeaderMap::new()).await;
    let mut blank = HeaderMap::new();
    blank.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
    let malformed = service.renew_session(&blank).await;
    let unknown = service.renew_session(&bearer("not-a-token")).await;

    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&missing), "Missing authorization header");
    assert_eq!(error(&malformed), "Invalid authorization header");
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&unknown), "Invalid update token");
}

#[tokio::test]
async fn test_renew_session_rejects_session_token() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;

    let response = service.renew_session(&bearer(&creds.session_token)).await;

    assert_eq!(error(&response), "Invalid update token");
}

// =========================================================================
// End-to-end
// =========================================================================

#[tokio::test]
async fn test_end_to_end_old_session_token_stops_working_after_renew() {
    let (service, _clock) = service();
    let st1 = sign_in(&service, "assert-alice").await;

    let created = service.create_room(&bearer(&st1.session_token), study_room("one")).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let st2: SessionPayload = data(&service.renew_session(&bearer(&st1.update_token)).await);

    let stale = service.create_room(&bearer(&st1.session_token), study_room("two")).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&stale), "Session token expired.");

    let fresh = service.create_room(&bearer(&st2.session_token), study_room("two")).await;
    assert_eq!(fresh.status, StatusCode::CREATED);
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_connect_info() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;

    let response = service
        .create_room(&bearer(&creds.session_token), study_room("study"))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let info: ConnectInfo = data(&response);
    assert_eq!(info.key, PROVIDER_KEY);
    assert_eq!(info.video_session_id, "local-1");
    assert!(!info.token.is_empty());

    let room: RoomView = data(&service.get_room("study").await);
    assert_eq!(room.members, vec![IdentityKey::new("alice")]);
    assert_eq!(room.num_sessions, 4);
}

#[tokio::test]
async fn test_create_room_without_session_is_unauthorized() {
    let (service, _clock) = service();

    let response = service.create_room(&HeaderMap::new(), study_room("study")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&response), "Missing authorization header");
    assert_eq!(service.get_room("study").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_room_expired_session_is_unauthorized() {
    let (service, clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    clock.advance(Duration::hours(1));

    let response = service
        .create_room(&bearer(&creds.session_token), study_room("study"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&response), "Session token expired.");
}

#[tokio::test]
async fn test_create_room_missing_field_is_bad_request() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    let req = CreateRoomRequest {
        break_length: None,
        ..study_room("study")
    };

    let response = service.create_room(&bearer(&creds.session_token), req).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error(&response), "Must enter length of break periods");
}

#[tokio::test]
async fn test_create_room_duplicate_code_is_conflict() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    let headers = bearer(&creds.session_token);
    service.create_room(&headers, study_room("study")).await;

    let response = service.create_room(&headers, study_room("study")).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_rooms_sorted_by_code() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    let headers = bearer(&creds.session_token);
    for code in ["zeta", "alpha"] {
        service.create_room(&headers, study_room(code)).await;
    }

    let response = service.list_rooms().await;

    assert_eq!(response.status, StatusCode::OK);
    let rooms: Vec<RoomView> = data(&response);
    let codes: Vec<&str> = rooms.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn test_list_rooms_empty_is_empty_array() {
    let (service, _clock) = service();

    let response = service.list_rooms().await;

    assert_eq!(response.body.data, Some(serde_json::json!([])));
}

#[tokio::test]
async fn test_get_room_unknown_code_is_not_found() {
    let (service, _clock) = service();

    let response = service.get_room("nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(error(&response), "Room invalid");
}

#[tokio::test]
async fn test_toggle_pause_needs_no_session() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    service
        .create_room(&bearer(&creds.session_token), study_room("study"))
        .await;

    let paused: RoomView = data(&service.toggle_pause("study").await);
    let resumed: RoomView = data(&service.toggle_pause("study").await);

    assert!(paused.paused);
    assert!(!resumed.paused);
}

#[tokio::test]
async fn test_toggle_pause_unknown_code_is_not_found() {
    let (service, _clock) = service();

    let response = service.toggle_pause("nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_room_adds_caller() {
    let (service, _clock) = service();
    let alice = sign_in(&service, "assert-alice").await;
    let bob = sign_in(&service, "assert-bob").await;
    service
        .create_room(&bearer(&alice.session_token), study_room("study"))
        .await;

    let response = service
        .join_room(
            &bearer(&bob.session_token),
            JoinRoomRequest {
                code: "study".into(),
            },
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let info: ConnectInfo = data(&response);
    assert_eq!(info.video_session_id, "local-1");
    let room: RoomView = data(&service.get_room("study").await);
    assert_eq!(
        room.members,
        vec![IdentityKey::new("alice"), IdentityKey::new("bob")]
    );
}

#[tokio::test]
async fn test_join_room_unknown_code_is_not_found() {
    let (service, _clock) = service();
    let bob = sign_in(&service, "assert-bob").await;

    let response = service
        .join_room(
            &bearer(&bob.session_token),
            JoinRoomRequest {
                code: "nope".into(),
            },
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(error(&response), "Room invalid");
}

#[tokio::test]
async fn test_join_room_without_session_is_unauthorized() {
    let (service, _clock) = service();

    let response = service
        .join_room(
            &bearer("bogus"),
            JoinRoomRequest {
                code: "study".into(),
            },
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&response), "Session token expired.");
}

#[tokio::test]
async fn test_delete_room_returns_deleted_room() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    let headers = bearer(&creds.session_token);
    service.create_room(&headers, study_room("study")).await;

    let response = service.delete_room(&headers, "study").await;

    assert_eq!(response.status, StatusCode::OK);
    let room: RoomView = data(&response);
    assert_eq!(room.code.as_str(), "study");
    assert_eq!(service.get_room("study").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_room_failures() {
    let (service, _clock) = service();
    let creds = sign_in(&service, "assert-alice").await;
    let headers = bearer(&creds.session_token);
    service.create_room(&headers, study_room("study")).await;

    let unauthorized = service.delete_room(&bearer("bogus"), "study").await;
    let missing = service.delete_room(&HeaderMap::new(), "study").await;
    let unknown = service.delete_room(&headers, "nope").await;

    assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error(&unauthorized), "Session token expired.");
    assert_eq!(error(&missing), "Missing authorization header");
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(service.get_room("study").await.status, StatusCode::OK);
}

// =========================================================================
// Bodies
// =========================================================================

#[tokio::test]
async fn test_decode_body_malformed_json_is_bad_request() {
    let (service, _clock) = service();

    let err = service
        .decode_body::<SignInRequest>(b"{not json")
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.public_message(), "Invalid request body");
}

#[tokio::test]
async fn test_decode_body_create_room_missing_fields_still_decodes() {
    let (service, _clock) = service();

    let req: CreateRoomRequest = service.decode_body(br#"{"code": "study"}"#).unwrap();

    assert_eq!(req.code.as_deref(), Some("study"));
    assert_eq!(req.num_sessions, None);
}

#[tokio::test]
async fn test_encode_response_failure_envelope() {
    let (service, _clock) = service();
    let response = service.get_room("nope").await;

    let bytes = service.encode_response(&response).unwrap();

    assert_eq!(bytes, br#"{"success":false,"error":"Room invalid"}"#);
}

#[tokio::test]
async fn test_encode_response_credentials_decode_as_typed_envelope() {
    let (service, _clock) = service();
    let response = service
        .sign_in(SignInRequest {
            id_token: "assert-bob".into(),
        })
        .await;

    let bytes = service.encode_response(&response).unwrap();
    let envelope: Envelope<SessionPayload> = service.decode_body(&bytes).unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.data, Some(data::<SessionPayload>(&response)));
}

// =========================================================================
// Concurrency and storage
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_sign_ins_agree() {
    let (service, _clock) = service();
    let service = Arc::new(service);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            service
                .sign_in(SignInRequest {
                    id_token: "assert-alice".into(),
                })
                .await
        }));
    }

    let mut payloads: Vec<SessionPayload> = Vec::new();
    for task in tasks {
        payloads.push(data(&task.await.unwrap()));
    }
    assert!(payloads.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(service.sessions().store().len().await, 1);
}

#[tokio::test]
async fn test_connect_uses_sqlite_database_url() {
    let config = FocusroomConfig::new(PROVIDER_KEY, "secret", "client-id");
    let verifier = StaticIdentityVerifier::new().with("assert-alice", "alice");

    let service = Focusroom::connect(&config, verifier, LocalVideoProvider::new())
        .await
        .unwrap();

    let response = service
        .sign_in(SignInRequest {
            id_token: "assert-alice".into(),
        })
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let creds: SessionPayload = data(&response);
    assert!(service.guard().authorize(&bearer(&creds.session_token)).await);
}
