use focusroom::prelude::*;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer(token: &str) -> Result<HeaderMap, FocusroomError> {
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| FocusroomError::Config(format!("token is not a header value: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

fn show<S, I, V>(
    service: &Focusroom<S, I, V>,
    step: &str,
    response: &ApiResponse,
) -> Result<(), FocusroomError>
where
    S: focusroom::session::CredentialStore,
    I: IdentityVerifier,
    V: VideoProvider,
{
    let mut shown = response.clone();
    if let Some(data) = shown.body.data.as_mut() {
        redact_tokens(data);
    }
    let body = service.encode_response(&shown)?;
    println!("{step:<28} {} {}", response.status, String::from_utf8_lossy(&body));
    Ok(())
}

const TOKEN_FIELDS: [&str; 3] = ["session_token", "update_token", "token"];

/// Masks every credential or provider token in `value` before it is printed.
fn redact_tokens(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(fields) => {
            for (name, field) in fields.iter_mut() {
                if TOKEN_FIELDS.contains(&name.as_str()) && field.is_string() {
                    *field = serde_json::Value::from("<redacted>");
                } else {
                    redact_tokens(field);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_tokens),
        _ => {}
    }
}

fn credentials(response: &ApiResponse) -> Result<SessionPayload, FocusroomError> {
    let data = response
        .body
        .data
        .clone()
        .ok_or_else(|| FocusroomError::Config("expected credentials in response".into()))?;
    serde_json::from_value(data)
        .map_err(|e| FocusroomError::Config(format!("unexpected credentials shape: {e}")))
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), FocusroomError> {
    // Real settings if the environment has them, demo values otherwise.
    let config = FocusroomConfig::from_env()
        .unwrap_or_else(|_| FocusroomConfig::new("demo-key", "demo-secret", "demo-client"));
    init_tracing(&config.log)?;
    tracing::info!(?config, "starting walkthrough");

    let verifier = StaticIdentityVerifier::new()
        .with("alice-assertion", "alice")
        .with("bob-assertion", "bob");
    let service = Focusroom::from_config(
        &config,
        MemoryCredentialStore::new(),
        verifier,
        LocalVideoProvider::new(),
    );

    // 1. Both users sign in.
    let response = service
        .sign_in(SignInRequest { id_token: "alice-assertion".into() })
        .await;
    show(&service, "alice signs in", &response)?;
    let alice = credentials(&response)?;

    let response = service
        .sign_in(SignInRequest { id_token: "bob-assertion".into() })
        .await;
    show(&service, "bob signs in", &response)?;
    let bob = credentials(&response)?;

    // 2. Alice opens a room: four 25/5 minute cycles.
    let request: CreateRoomRequest = service.decode_body(
        br#"{"code": "deep-work", "num_sessions": 4, "work_length": 1500, "break_length": 300}"#,
    )?;
    let response = service.create_room(&bearer(&alice.session_token)?, request).await;
    show(&service, "alice creates deep-work", &response)?;

    // 3. Bob joins, then anyone may pause it.
    let response = service
        .join_room(
            &bearer(&bob.session_token)?,
            JoinRoomRequest { code: "deep-work".into() },
        )
        .await;
    show(&service, "bob joins deep-work", &response)?;

    let response = service.toggle_pause("deep-work").await;
    show(&service, "pause deep-work", &response)?;

    let response = service.list_rooms().await;
    show(&service, "list rooms", &response)?;

    // 4. Alice renews; her old session token stops working.
    let response = service.renew_session(&bearer(&alice.update_token)?).await;
    show(&service, "alice renews", &response)?;
    let renewed = credentials(&response)?;

    let response = service
        .delete_room(&bearer(&alice.session_token)?, "deep-work")
        .await;
    show(&service, "delete with stale token", &response)?;

    let response = service
        .delete_room(&bearer(&renewed.session_token)?, "deep-work")
        .await;
    show(&service, "delete with fresh token", &response)?;

    let response = service.get_room("deep-work").await;
    show(&service, "get deleted room", &response)?;

    Ok(())
}
