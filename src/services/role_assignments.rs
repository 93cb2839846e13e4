use std::sync::Arc;
use tracing::info;

use super::ensure_principal_exists;
use crate::auth::RequestContext;
use crate::authz::Authorizer;
use crate::domain::{Role, RoleAssignment, RoleType};
use crate::error::{CoreError, Result};
use crate::store::{RoleAssignmentsStore, ServiceAccountsStore, UsersStore};

/// Grants and revokes system-level roles. Requires ADMIN.
pub struct RoleAssignmentsService {
    authorizer: Arc<dyn Authorizer>,
    users: Arc<dyn UsersStore>,
    service_accounts: Arc<dyn ServiceAccountsStore>,
    role_assignments: Arc<dyn RoleAssignmentsStore>,
}

impl RoleAssignmentsService {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        users: Arc<dyn UsersStore>,
        service_accounts: Arc<dyn ServiceAccountsStore>,
        role_assignments: Arc<dyn RoleAssignmentsStore>,
    ) -> Self {
        Self {
            authorizer,
            users,
            service_accounts,
            role_assignments,
        }
    }

    pub async fn grant(&self, ctx: &RequestContext, assignment: &RoleAssignment) -> Result<()> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        // SYSTEM roles belong to infrastructure principals only.
        if assignment.role.role_type != RoleType::Platform {
            return Err(CoreError::bad_request(format!(
                "role {} cannot be granted",
                assignment.role
            )));
        }
        ensure_principal_exists(
            self.users.as_ref(),
            self.service_accounts.as_ref(),
            &assignment.principal,
        )
        .await?;
        self.role_assignments.grant(assignment).await?;
        info!(
            role = %assignment.role,
            principal_type = %assignment.principal.principal_type,
            principal_id = %assignment.principal.id,
            "granted role"
        );
        Ok(())
    }

    pub async fn revoke(&self, ctx: &RequestContext, assignment: &RoleAssignment) -> Result<()> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        ensure_principal_exists(
            self.users.as_ref(),
            self.service_accounts.as_ref(),
            &assignment.principal,
        )
        .await?;
        self.role_assignments.revoke(assignment).await?;
        info!(
            role = %assignment.role,
            principal_type = %assignment.principal.principal_type,
            principal_id = %assignment.principal.id,
            "revoked role"
        );
        Ok(())
    }
}
