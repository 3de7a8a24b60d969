//! Room manager configuration.

use serde::{Deserialize, Serialize};

/// Limits applied when rooms are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomManagerConfig {
    /// Longest room code accepted, in characters.
    pub max_code_len: usize,
}

impl Default for RoomManagerConfig {
    fn default() -> Self {
        Self { max_code_len: 32 }
    }
}
