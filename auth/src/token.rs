use rand::rngs::OsRng;
use rand::RngCore;

/// Refresh token size in bytes (32 bytes = 256 bits of entropy)
const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate an opaque refresh token.
///
/// Draws from the operating system CSPRNG, so knowing earlier tokens says
/// nothing about the next one. Hex encoded, 64 characters.
pub fn generate_refresh_token() -> String {
    let mut buffer = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}
