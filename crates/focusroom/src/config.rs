//! Service configuration, loaded from the environment.
//!
//! | variable | required | default |
//! |---|---|---|
//! | `API_KEY` | yes | |
//! | `API_SECRET` | yes | |
//! | `CLIENT_ID` | yes | |
//! | `DATABASE_URL` | no | `sqlite::memory:` |
//! | `SESSION_WINDOW_SECS` | no | `86400` |
//! | `ROTATE_UPDATE_TOKEN` | no | `false` |
//! | `LOG_LEVEL` | no | `info` |
//! | `LOG_FORMAT` | no | `compact` (`json` also accepted) |

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use focusroom_room::RoomManagerConfig;
use focusroom_session::{MAX_SESSION_WINDOW_SECS, SessionConfig};
use serde::{Deserialize, Serialize};

use crate::FocusroomError;

// ---------------------------------------------------------------------------
// LogConfig
// ---------------------------------------------------------------------------

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = FocusroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "pretty" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(FocusroomError::Config(format!(
                "LOG_FORMAT must be `compact` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// An `EnvFilter` directive, e.g. `info` or `focusroom=debug,sqlx=warn`.
    /// `RUST_LOG` wins over this when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

// ---------------------------------------------------------------------------
// FocusroomConfig
// ---------------------------------------------------------------------------

/// Everything needed to stand up a [`Focusroom`](crate::Focusroom).
#[derive(Clone)]
pub struct FocusroomConfig {
    /// Public video-provider key, handed to clients in `ConnectInfo`.
    pub provider_api_key: String,
    /// Private video-provider secret. Never sent to clients or logged.
    pub provider_api_secret: String,
    /// OAuth client id identity assertions must be issued for.
    pub identity_client_id: String,
    pub database_url: String,
    pub session: SessionConfig,
    pub rooms: RoomManagerConfig,
    pub log: LogConfig,
}

impl FocusroomConfig {
    /// A config with the three required values and defaults elsewhere.
    pub fn new(
        provider_api_key: impl Into<String>,
        provider_api_secret: impl Into<String>,
        identity_client_id: impl Into<String>,
    ) -> Self {
        Self {
            provider_api_key: provider_api_key.into(),
            provider_api_secret: provider_api_secret.into(),
            identity_client_id: identity_client_id.into(),
            database_url: "sqlite::memory:".to_string(),
            session: SessionConfig::default(),
            rooms: RoomManagerConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, FocusroomError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(FocusroomError::Config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FocusroomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| FocusroomError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required("API_KEY")?,
            required("API_SECRET")?,
            required("CLIENT_ID")?,
        );

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(secs) = get("SESSION_WINDOW_SECS") {
            config.session.session_window = parse_window(&secs)?;
        }
        if let Some(flag) = get("ROTATE_UPDATE_TOKEN") {
            config.session.rotate_update_token = parse_bool("ROTATE_UPDATE_TOKEN", &flag)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log.level = level;
        }
        if let Some(format) = get("LOG_FORMAT") {
            config.log.format = format.parse()?;
        }

        Ok(config)
    }
}

impl fmt::Debug for FocusroomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusroomConfig")
            .field("provider_api_key", &self.provider_api_key)
            .field("provider_api_secret", &"<redacted>")
            .field("identity_client_id", &self.identity_client_id)
            .field("database_url", &self.database_url)
            .field("session", &self.session)
            .field("rooms", &self.rooms)
            .field("log", &self.log)
            .finish()
    }
}

fn parse_window(raw: &str) -> Result<Duration, FocusroomError> {
    raw.parse::<i64>()
        .ok()
        .filter(|secs| (1..=MAX_SESSION_WINDOW_SECS).contains(secs))
        .and_then(Duration::try_seconds)
        .ok_or_else(|| {
            FocusroomError::Config(format!(
                "SESSION_WINDOW_SECS must be between 1 and {MAX_SESSION_WINDOW_SECS}, got `{raw}`"
            ))
        })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, FocusroomError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FocusroomError::Config(format!(
            "{key} must be true or false, got `{raw}`"
        ))),
    }
}
