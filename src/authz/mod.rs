//! Role/scope authorization
//!
//! Both authorizers follow the same algorithm:
//!
//! 1. No principal attached: deny.
//! 2. Infrastructure principal (root, scheduler, observer, worker): match
//!    the requested roles against its fixed list. No store is consulted.
//! 3. User or service account: ask the assignments store whether any of
//!    the requested roles is held, in the order given. A store error is
//!    logged and treated as a denial.
//!
//! Every denial is a [`CoreError::Authorization`](crate::CoreError).

mod project;
mod system;

pub use project::ProjectRoleAuthorizer;
pub use system::SystemAuthorizer;

use async_trait::async_trait;

use crate::domain::{Principal, ProjectRole, Role};
use crate::error::{CoreError, Result};

/// Authorizes system-level operations
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Succeeds if `principal` holds at least one of `roles`
    async fn authorize(&self, principal: Option<&Principal>, roles: &[Role]) -> Result<()>;
}

/// Authorizes operations on a single project
#[async_trait]
pub trait ProjectAuthorizer: Send + Sync {
    /// Succeeds if `principal` holds at least one of `roles`
    async fn authorize(&self, principal: Option<&Principal>, roles: &[ProjectRole])
        -> Result<()>;
}

pub(crate) fn denied() -> CoreError {
    CoreError::authorization("the principal is not authorized to perform this operation")
}
