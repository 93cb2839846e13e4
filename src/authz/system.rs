use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{denied, Authorizer};
use crate::domain::{Principal, Role, RoleAssignment};
use crate::error::Result;
use crate::store::RoleAssignmentsStore;

/// Authorizer for system-level [`Role`]s
#[derive(Clone)]
pub struct SystemAuthorizer {
    role_assignments: Arc<dyn RoleAssignmentsStore>,
}

impl SystemAuthorizer {
    pub fn new(role_assignments: Arc<dyn RoleAssignmentsStore>) -> Self {
        Self { role_assignments }
    }
}

#[async_trait]
impl Authorizer for SystemAuthorizer {
    async fn authorize(&self, principal: Option<&Principal>, roles: &[Role]) -> Result<()> {
        let Some(principal) = principal else {
            return Err(denied());
        };

        if let Some(held) = principal.roles() {
            if roles
                .iter()
                .any(|requested| held.iter().any(|role| role.matches(requested)))
            {
                return Ok(());
            }
            debug!(principal = principal.kind(), "fixed roles do not satisfy request");
            return Err(denied());
        }

        // Only users and service accounts carry a reference. Anything else
        // is denied outright.
        let Some(reference) = principal.reference() else {
            return Err(denied());
        };

        for role in roles {
            let assignment = RoleAssignment {
                role: role.clone(),
                principal: reference.clone(),
            };
            match self.role_assignments.exists(&assignment).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        principal_type = %reference.principal_type,
                        principal_id = %reference.id,
                        role = %role,
                        error = %e,
                        "error checking role assignment; denying"
                    );
                    return Err(denied());
                }
            }
        }

        Err(denied())
    }
}
