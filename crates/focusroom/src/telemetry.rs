//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{FocusroomError, LogConfig, LogFormat};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `config.level` when set. Fails if a global
/// subscriber is already installed or the level is not a valid filter.
pub fn init_tracing(config: &LogConfig) -> Result<(), FocusroomError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            FocusroomError::Config(format!("invalid log level `{}`: {e}", config.level))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };
    installed.map_err(|e| FocusroomError::Config(format!("tracing already initialized: {e}")))?;

    tracing::info!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}
