//! Who is performing a request
//!
//! Four principals are the platform's own infrastructure: root, the
//! scheduler, the observer, and the worker running a given event. Their
//! privileges are fixed here, in code, and checking them never touches a
//! store. Users and service accounts are looked up per request, and their
//! privileges live in role assignment stores.

use std::fmt;

use super::role::{PrincipalReference, ProjectRole, Role, GLOBAL_SCOPE};
use super::user::{ServiceAccount, User};

/// The authenticated identity attached to a request
#[derive(Clone, PartialEq, Eq)]
pub enum Principal {
    Root,
    Scheduler,
    Observer,
    Worker { event_id: String },
    User(User),
    ServiceAccount(ServiceAccount),
}

impl Principal {
    pub fn worker(event_id: impl Into<String>) -> Self {
        Principal::Worker {
            event_id: event_id.into(),
        }
    }

    /// Fixed system-level privileges, or `None` if this principal's
    /// privileges have to be looked up in a store.
    pub fn roles(&self) -> Option<Vec<Role>> {
        match self {
            Principal::Root => Some(vec![
                Role::admin(),
                Role::reader(),
                Role::project_creator(),
                Role::event_creator(GLOBAL_SCOPE),
            ]),
            Principal::Scheduler => Some(vec![Role::reader(), Role::scheduler()]),
            Principal::Observer => Some(vec![Role::reader(), Role::observer()]),
            Principal::Worker { event_id } => {
                Some(vec![Role::reader(), Role::worker(event_id.clone())])
            }
            Principal::User(_) | Principal::ServiceAccount(_) => None,
        }
    }

    /// Fixed project-level privileges, or `None` for store-backed principals
    pub fn project_roles(&self) -> Option<Vec<ProjectRole>> {
        match self {
            Principal::Root => Some(vec![
                ProjectRole::admin(GLOBAL_SCOPE),
                ProjectRole::developer(GLOBAL_SCOPE),
                ProjectRole::user(GLOBAL_SCOPE),
            ]),
            Principal::Scheduler | Principal::Observer | Principal::Worker { .. } => {
                Some(Vec::new())
            }
            Principal::User(_) | Principal::ServiceAccount(_) => None,
        }
    }

    /// Reference used to look up role assignments. Infrastructure principals
    /// can't hold role assignments and return `None`.
    pub fn reference(&self) -> Option<PrincipalReference> {
        match self {
            Principal::User(user) => Some(PrincipalReference::user(user.id.clone())),
            Principal::ServiceAccount(sa) => {
                Some(PrincipalReference::service_account(sa.id.clone()))
            }
            Principal::Root
            | Principal::Scheduler
            | Principal::Observer
            | Principal::Worker { .. } => None,
        }
    }

    /// Returns true for the four principals with privileges fixed in code
    pub fn is_infrastructure(&self) -> bool {
        self.roles().is_some()
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::Root => "root",
            Principal::Scheduler => "scheduler",
            Principal::Observer => "observer",
            Principal::Worker { .. } => "worker",
            Principal::User(_) => "user",
            Principal::ServiceAccount(_) => "service_account",
        }
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hand-written so that new fields on User or ServiceAccount don't
        // show up in log messages unless someone adds them here.
        match self {
            Principal::Root => f.write_str("Principal::Root"),
            Principal::Scheduler => f.write_str("Principal::Scheduler"),
            Principal::Observer => f.write_str("Principal::Observer"),
            Principal::Worker { event_id } => f
                .debug_struct("Principal::Worker")
                .field("event_id", event_id)
                .finish(),
            Principal::User(user) => f
                .debug_struct("Principal::User")
                .field("id", &user.id)
                .finish_non_exhaustive(),
            Principal::ServiceAccount(sa) => f
                .debug_struct("Principal::ServiceAccount")
                .field("id", &sa.id)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_principals_have_fixed_roles() {
        for principal in [
            Principal::Root,
            Principal::Scheduler,
            Principal::Observer,
            Principal::worker("e1"),
        ] {
            assert!(principal.is_infrastructure(), "{principal:?}");
            assert!(principal.project_roles().is_some());
            assert!(principal.reference().is_none());
        }
    }

    #[test]
    fn test_store_backed_principals_have_no_fixed_roles() {
        let user = Principal::User(User::new("tony@example.com", "Tony"));
        assert!(user.roles().is_none());
        assert!(user.project_roles().is_none());
        assert_eq!(
            user.reference(),
            Some(PrincipalReference::user("tony@example.com"))
        );

        let sa = Principal::ServiceAccount(ServiceAccount::new("jarvis", ""));
        assert!(sa.roles().is_none());
        assert_eq!(
            sa.reference(),
            Some(PrincipalReference::service_account("jarvis"))
        );
    }

    #[test]
    fn test_worker_scoped_to_its_event() {
        let roles = Principal::worker("e1").roles().unwrap();
        assert!(roles.iter().any(|r| r.matches(&Role::worker("e1"))));
        assert!(!roles.iter().any(|r| r.matches(&Role::worker("e2"))));
    }

    #[test]
    fn test_root_has_every_project_role() {
        let roles = Principal::Root.project_roles().unwrap();
        for requested in [
            ProjectRole::admin("italian"),
            ProjectRole::developer("italian"),
            ProjectRole::user("italian"),
        ] {
            assert!(roles.iter().any(|r| r.matches(&requested)));
        }
    }

    #[test]
    fn test_debug_omits_secrets() {
        let mut sa = ServiceAccount::new("jarvis", "");
        sa.hashed_token = "deadbeef".to_string();
        let out = format!("{:?}", Principal::ServiceAccount(sa));
        assert!(out.contains("jarvis"));
        assert!(!out.contains("deadbeef"));
    }
}
