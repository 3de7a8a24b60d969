//! Opaque bearer token generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes per token: 256 bits of entropy.
const TOKEN_BYTES: usize = 32;

/// Length of every generated token: 32 bytes in unpadded base64.
pub const TOKEN_LEN: usize = 43;

/// Generates a fresh opaque token: 32 random bytes, URL-safe base64,
/// no padding.
///
/// The bytes come from `rand`'s thread-local CSPRNG, seeded from the OS.
/// If the OS entropy source fails, `rand` panics; there is nothing sensible
/// to recover to, so that failure is left process-fatal.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
