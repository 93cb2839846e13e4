//! HTTP surface helpers
//!
//! This crate defines no routes. It provides the error body shared by
//! [`auth_middleware`](crate::auth::auth_middleware) and by whatever
//! handlers the embedding service mounts behind it.

mod error;

pub use error::*;
