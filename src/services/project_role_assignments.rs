use std::sync::Arc;
use tracing::info;

use super::ensure_principal_exists;
use crate::auth::RequestContext;
use crate::authz::ProjectAuthorizer;
use crate::domain::{ProjectRole, ProjectRoleAssignment};
use crate::error::Result;
use crate::store::{ProjectRoleAssignmentsStore, ServiceAccountsStore, UsersStore};

/// Grants and revokes project roles. Requires PROJECT_ADMIN on the project
/// named by the assignment.
pub struct ProjectRoleAssignmentsService {
    authorizer: Arc<dyn ProjectAuthorizer>,
    users: Arc<dyn UsersStore>,
    service_accounts: Arc<dyn ServiceAccountsStore>,
    project_role_assignments: Arc<dyn ProjectRoleAssignmentsStore>,
}

impl ProjectRoleAssignmentsService {
    pub fn new(
        authorizer: Arc<dyn ProjectAuthorizer>,
        users: Arc<dyn UsersStore>,
        service_accounts: Arc<dyn ServiceAccountsStore>,
        project_role_assignments: Arc<dyn ProjectRoleAssignmentsStore>,
    ) -> Self {
        Self {
            authorizer,
            users,
            service_accounts,
            project_role_assignments,
        }
    }

    async fn authorize(&self, ctx: &RequestContext, assignment: &ProjectRoleAssignment) -> Result<()> {
        self.authorizer
            .authorize(
                ctx.principal(),
                &[ProjectRole::admin(assignment.role.project_id.clone())],
            )
            .await?;
        ensure_principal_exists(
            self.users.as_ref(),
            self.service_accounts.as_ref(),
            &assignment.principal,
        )
        .await
    }

    pub async fn grant(
        &self,
        ctx: &RequestContext,
        assignment: &ProjectRoleAssignment,
    ) -> Result<()> {
        self.authorize(ctx, assignment).await?;
        self.project_role_assignments.grant(assignment).await?;
        info!(
            role = %assignment.role,
            principal_type = %assignment.principal.principal_type,
            principal_id = %assignment.principal.id,
            "granted project role"
        );
        Ok(())
    }

    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        assignment: &ProjectRoleAssignment,
    ) -> Result<()> {
        self.authorize(ctx, assignment).await?;
        self.project_role_assignments.revoke(assignment).await?;
        info!(
            role = %assignment.role,
            principal_type = %assignment.principal.principal_type,
            principal_id = %assignment.principal.id,
            "revoked project role"
        );
        Ok(())
    }
}
