//! Store interfaces consumed by the security core
//!
//! Persistence is somebody else's problem. Every lookup that finds nothing
//! must fail with [`CoreError::NotFound`](crate::CoreError::NotFound); the
//! token filter relies on that to tell "try the next credential kind" apart
//! from a real outage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::domain::{
    Event, ProjectRoleAssignment, ProjectRoleAssignmentsSelector, RoleAssignment,
    RoleAssignmentsSelector, ServiceAccount, Session, User,
};
use crate::error::Result;

/// Sessions, keyed by id and by hashed secrets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionsStore: Send + Sync {
    async fn create(&self, session: &Session) -> Result<()>;

    async fn get_by_hashed_oauth2_state(&self, hashed_oauth2_state: &str) -> Result<Session>;

    async fn get_by_hashed_token(&self, hashed_token: &str) -> Result<Session>;

    /// Moves a pending session to active by attaching its owner and expiry.
    ///
    /// Invariant: succeeds at most once per session, even under concurrent
    /// callers.
    async fn authenticate(
        &self,
        session_id: &str,
        user_id: &str,
        expires: DateTime<Utc>,
    ) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Deletes every session belonging to a user
    async fn delete_by_user(&self, user_id: &str) -> Result<()>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;

    async fn get(&self, id: &str) -> Result<User>;

    async fn list(&self) -> Result<Vec<User>>;

    async fn lock(&self, id: &str) -> Result<()>;

    async fn unlock(&self, id: &str) -> Result<()>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceAccountsStore: Send + Sync {
    async fn create(&self, service_account: &ServiceAccount) -> Result<()>;

    async fn get(&self, id: &str) -> Result<ServiceAccount>;

    async fn get_by_hashed_token(&self, hashed_token: &str) -> Result<ServiceAccount>;

    async fn list(&self) -> Result<Vec<ServiceAccount>>;

    async fn lock(&self, id: &str) -> Result<()>;

    /// Unlocks the account and replaces its token hash
    async fn unlock(&self, id: &str, new_hashed_token: &str) -> Result<()>;
}

/// System-level role assignments
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleAssignmentsStore: Send + Sync {
    /// Idempotent: granting an existing assignment is not an error
    async fn grant(&self, assignment: &RoleAssignment) -> Result<()>;

    /// Idempotent: revoking a missing assignment is not an error
    async fn revoke(&self, assignment: &RoleAssignment) -> Result<()>;

    async fn revoke_many(&self, selector: &RoleAssignmentsSelector) -> Result<()>;

    /// Returns true if the principal holds a role that
    /// [matches](crate::domain::Role::matches) the requested one, so a
    /// grant with global scope satisfies a query for any concrete scope.
    async fn exists(&self, assignment: &RoleAssignment) -> Result<bool>;
}

/// Project-level role assignments
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProjectRoleAssignmentsStore: Send + Sync {
    async fn grant(&self, assignment: &ProjectRoleAssignment) -> Result<()>;

    async fn revoke(&self, assignment: &ProjectRoleAssignment) -> Result<()>;

    async fn revoke_many(&self, selector: &ProjectRoleAssignmentsSelector) -> Result<()>;

    async fn exists(&self, assignment: &ProjectRoleAssignment) -> Result<bool>;
}

/// The one event lookup principal resolution needs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventsStore: Send + Sync {
    async fn get_by_hashed_worker_token(&self, hashed_worker_token: &str) -> Result<Event>;
}
