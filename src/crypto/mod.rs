//! Credential primitives for the security core
//!
//! Provides:
//! - One-way salted hashing of tokens and passwords
//! - High-entropy bearer token generation
//!
//! Clear-text secrets are hashed once, as early as possible, and only the
//! hash is ever stored or compared.

mod hash;
mod token;


pub use hash::*;
pub use token::*;
