//! Domain models for the security core
//!
//! Principals, roles and role assignments, sessions and the wire payloads
//! returned when credentials are issued.

mod event;
mod principal;
mod role;
mod session;
mod user;

pub use event::*;
pub use principal::*;
pub use role::*;
pub use session::*;
pub use user::*;
