//! Roles, role assignments and the scope matching rule
//!
//! Two parallel role systems exist:
//!
//! - system-level [`Role`]s, `{type, name, scope}`
//! - project-level [`ProjectRole`]s, `{name, project_id}`
//!
//! Both use the same matching rule: names must be equal, and the scope of
//! the left-hand role must either equal the scope of the right-hand role or
//! be the global wildcard [`GLOBAL_SCOPE`]. The rule is deliberately one
//! directional. A role held with global scope satisfies a request for any
//! concrete scope, but a role held for one concrete scope never satisfies a
//! request for another.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope value that subsumes every concrete scope
pub const GLOBAL_SCOPE: &str = "*";

/// Distinguishes roles that may be granted to users and service accounts
/// from roles reserved for the platform's own components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleType {
    Platform,
    System,
}

/// Name of a system-level role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Admin,
    Reader,
    ProjectCreator,
    EventCreator,
    Scheduler,
    Observer,
    Worker,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::Reader => "READER",
            RoleName::ProjectCreator => "PROJECT_CREATOR",
            RoleName::EventCreator => "EVENT_CREATOR",
            RoleName::Scheduler => "SCHEDULER",
            RoleName::Observer => "OBSERVER",
            RoleName::Worker => "WORKER",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A system-level role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "type")]
    pub role_type: RoleType,
    pub name: RoleName,
    /// Empty for roles that carry no scope
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

impl Role {
    fn platform(name: RoleName, scope: impl Into<String>) -> Self {
        Self {
            role_type: RoleType::Platform,
            name,
            scope: scope.into(),
        }
    }

    fn system(name: RoleName, scope: impl Into<String>) -> Self {
        Self {
            role_type: RoleType::System,
            name,
            scope: scope.into(),
        }
    }

    /// Full read/write access to everything system-level
    pub fn admin() -> Self {
        Self::platform(RoleName::Admin, "")
    }

    /// Read-only access to system-level resources
    pub fn reader() -> Self {
        Self::platform(RoleName::Reader, "")
    }

    /// Permission to create new projects
    pub fn project_creator() -> Self {
        Self::platform(RoleName::ProjectCreator, "")
    }

    /// Permission to create events on behalf of the source named by `scope`
    pub fn event_creator(scope: impl Into<String>) -> Self {
        Self::platform(RoleName::EventCreator, scope)
    }

    pub fn scheduler() -> Self {
        Self::system(RoleName::Scheduler, GLOBAL_SCOPE)
    }

    pub fn observer() -> Self {
        Self::system(RoleName::Observer, GLOBAL_SCOPE)
    }

    /// Privileges of the worker handling one specific event
    pub fn worker(event_id: impl Into<String>) -> Self {
        Self::system(RoleName::Worker, event_id)
    }

    /// Returns true if holding `self` satisfies a request for `requested`.
    pub fn matches(&self, requested: &Role) -> bool {
        self.name == requested.name
            && (self.scope == requested.scope || self.scope == GLOBAL_SCOPE)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.scope)
        }
    }
}

/// Name of a project-level role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRoleName {
    ProjectAdmin,
    ProjectDeveloper,
    ProjectUser,
}

impl ProjectRoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRoleName::ProjectAdmin => "PROJECT_ADMIN",
            ProjectRoleName::ProjectDeveloper => "PROJECT_DEVELOPER",
            ProjectRoleName::ProjectUser => "PROJECT_USER",
        }
    }
}

impl fmt::Display for ProjectRoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project-level role. `project_id` plays the part of the scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
    pub name: ProjectRoleName,
    pub project_id: String,
}

impl ProjectRole {
    pub fn new(name: ProjectRoleName, project_id: impl Into<String>) -> Self {
        Self {
            name,
            project_id: project_id.into(),
        }
    }

    /// Full control of a project, including its role assignments
    pub fn admin(project_id: impl Into<String>) -> Self {
        Self::new(ProjectRoleName::ProjectAdmin, project_id)
    }

    /// Permission to update a project
    pub fn developer(project_id: impl Into<String>) -> Self {
        Self::new(ProjectRoleName::ProjectDeveloper, project_id)
    }

    /// Permission to create and manage a project's events
    pub fn user(project_id: impl Into<String>) -> Self {
        Self::new(ProjectRoleName::ProjectUser, project_id)
    }

    /// Returns true if holding `self` satisfies a request for `requested`.
    pub fn matches(&self, requested: &ProjectRole) -> bool {
        self.name == requested.name
            && (self.project_id == requested.project_id || self.project_id == GLOBAL_SCOPE)
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.project_id)
    }
}

/// Kinds of principal that roles can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalType {
    User,
    ServiceAccount,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "USER",
            PrincipalType::ServiceAccount => "SERVICE_ACCOUNT",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a store-backed principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalReference {
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    pub id: String,
}

impl PrincipalReference {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            principal_type: PrincipalType::User,
            id: id.into(),
        }
    }

    pub fn service_account(id: impl Into<String>) -> Self {
        Self {
            principal_type: PrincipalType::ServiceAccount,
            id: id.into(),
        }
    }
}

/// A persisted grant of a system-level [`Role`] to a principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub principal: PrincipalReference,
}

/// A persisted grant of a [`ProjectRole`] to a principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRoleAssignment {
    pub role: ProjectRole,
    pub principal: PrincipalReference,
}

/// Selects role assignments for bulk revocation. `None` fields match
/// anything; an all-`None` selector matches every assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignmentsSelector {
    pub principal: Option<PrincipalReference>,
    pub role_name: Option<RoleName>,
}

impl RoleAssignmentsSelector {
    pub fn selects(&self, assignment: &RoleAssignment) -> bool {
        self.principal
            .as_ref()
            .map_or(true, |p| *p == assignment.principal)
            && self.role_name.map_or(true, |n| n == assignment.role.name)
    }
}

/// Selects project role assignments for bulk revocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRoleAssignmentsSelector {
    pub project_id: Option<String>,
    pub principal: Option<PrincipalReference>,
}

impl ProjectRoleAssignmentsSelector {
    pub fn selects(&self, assignment: &ProjectRoleAssignment) -> bool {
        self.project_id
            .as_ref()
            .map_or(true, |p| *p == assignment.role.project_id)
            && self
                .principal
                .as_ref()
                .map_or(true, |p| *p == assignment.principal)
    }
}
