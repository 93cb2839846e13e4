//! Authorized operations on users, service accounts and role assignments
//!
//! Every operation takes the caller's [`RequestContext`] explicitly and
//! checks it against an authorizer before touching a store.
//!
//! [`RequestContext`]: crate::auth::RequestContext

mod project_role_assignments;
mod role_assignments;
mod service_accounts;
mod users;

pub use project_role_assignments::ProjectRoleAssignmentsService;
pub use role_assignments::RoleAssignmentsService;
pub use service_accounts::ServiceAccountsService;
pub use users::UsersService;

use crate::domain::{PrincipalReference, PrincipalType};
use crate::error::Result;
use crate::store::{ServiceAccountsStore, UsersStore};

/// Fails with not-found unless the referenced user or service account exists
async fn ensure_principal_exists(
    users: &dyn UsersStore,
    service_accounts: &dyn ServiceAccountsStore,
    principal: &PrincipalReference,
) -> Result<()> {
    match principal.principal_type {
        PrincipalType::User => users.get(&principal.id).await.map(|_| ()),
        PrincipalType::ServiceAccount => service_accounts.get(&principal.id).await.map(|_| ()),
    }
}
