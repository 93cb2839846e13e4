//! Bearer token generation

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// Minimum length of every generated token
pub const MIN_TOKEN_LENGTH: usize = 64;

/// Generate a new random token of `max(length, 64)` alphanumeric characters.
///
/// Tokens begin with a hyphen-less UUIDv4 so that two tokens never collide,
/// followed by characters drawn from a thread-local CSPRNG.
pub fn new_token(length: usize) -> String {
    let length = length.max(MIN_TOKEN_LENGTH);
    let prefix = Uuid::new_v4().simple().to_string();
    let mut token = String::with_capacity(length);
    token.push_str(&prefix);

    let rng = rand::thread_rng();
    token.extend(
        rng.sample_iter(&Alphanumeric)
            .take(length - prefix.len())
            .map(char::from),
    );
    token
}
