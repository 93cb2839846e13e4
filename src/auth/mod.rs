//! Bearer token authentication
//!
//! One opaque token, five kinds of principal. [`TokenAuthFilter`] tries the
//! credential kinds in a fixed order, cheapest and most privileged first:
//!
//! 1. the scheduler's shared secret
//! 2. the observer's shared secret
//! 3. an event's worker token
//! 4. a service account token
//! 5. a session token (root or user)
//!
//! Only hashes are ever compared or looked up. The resolved principal is
//! returned in a [`RequestContext`]; nothing is stored globally.

mod context;
mod filter;
mod middleware;

pub use context::*;
pub use filter::*;
pub use middleware::*;
