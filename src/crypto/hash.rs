//! Salted SHA-256 hashing for stored secrets
//!
//! Session tokens, OAuth2 state nonces, service account tokens and worker
//! tokens are all stored as `hash("", value)`. The root password is stored as
//! `hash("root", password)`.

use sha2::{Digest, Sha256};

/// Salt used for every bearer-style secret (tokens, OAuth2 state)
pub const NO_SALT: &str = "";

/// Hash `input` with `salt`, returning lowercase hex.
///
/// The digest covers `salt || input`. Output is always 64 characters.
pub fn hash(salt: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a bearer-style secret. Shorthand for `hash(NO_SALT, value)`.
#[inline]
pub fn hash_token(value: &str) -> String {
    hash(NO_SALT, value)
}
