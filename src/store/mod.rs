//! Store interfaces and in-memory implementations
//!
//! - [`SessionsStore`], [`UsersStore`], [`ServiceAccountsStore`]
//! - [`RoleAssignmentsStore`], [`ProjectRoleAssignmentsStore`]
//! - [`EventsStore`] (worker token resolution only)

pub mod memory;
mod traits;

pub use traits::*;
