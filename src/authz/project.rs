use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{denied, ProjectAuthorizer};
use crate::domain::{Principal, ProjectRole, ProjectRoleAssignment};
use crate::error::Result;
use crate::store::ProjectRoleAssignmentsStore;

/// Authorizer for [`ProjectRole`]s
#[derive(Clone)]
pub struct ProjectRoleAuthorizer {
    project_role_assignments: Arc<dyn ProjectRoleAssignmentsStore>,
}

impl ProjectRoleAuthorizer {
    pub fn new(project_role_assignments: Arc<dyn ProjectRoleAssignmentsStore>) -> Self {
        Self {
            project_role_assignments,
        }
    }
}

#[async_trait]
impl ProjectAuthorizer for ProjectRoleAuthorizer {
    async fn authorize(
        &self,
        principal: Option<&Principal>,
        roles: &[ProjectRole],
    ) -> Result<()> {
        let Some(principal) = principal else {
            return Err(denied());
        };

        if let Some(held) = principal.project_roles() {
            if roles
                .iter()
                .any(|requested| held.iter().any(|role| role.matches(requested)))
            {
                return Ok(());
            }
            debug!(principal = principal.kind(), "fixed project roles do not satisfy request");
            return Err(denied());
        }

        let Some(reference) = principal.reference() else {
            return Err(denied());
        };

        for role in roles {
            let assignment = ProjectRoleAssignment {
                role: role.clone(),
                principal: reference.clone(),
            };
            match self.project_role_assignments.exists(&assignment).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        principal_type = %reference.principal_type,
                        principal_id = %reference.id,
                        role = %role,
                        error = %e,
                        "error checking project role assignment; denying"
                    );
                    return Err(denied());
                }
            }
        }

        Err(denied())
    }
}
