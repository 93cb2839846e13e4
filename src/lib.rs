//! Orchestra Security
//!
//! Authentication and authorization core for a multi-tenant event
//! orchestration platform: who is making a request, and what they may do.
//!
//! ## Modules
//!
//! - [`domain`] - Principals, roles, role assignments, sessions
//! - [`crypto`] - Token hashing and generation
//! - [`store`] - Store interfaces and in-memory implementations
//! - [`auth`] - Bearer token principal resolution and Axum middleware
//! - [`authz`] - System and project role authorizers
//! - [`session`] - Session lifecycle and OAuth2/OpenID Connect federation
//! - [`services`] - Authorized user, service account and role operations
//! - [`api`] - Error responses
//! - [`config`] - Environment configuration
//! - [`telemetry`] - Logging setup

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod services;
pub mod session;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{auth_middleware, RequestContext, TokenAuthFilter, TokenAuthFilterConfig};
pub use authz::{Authorizer, ProjectAuthorizer, ProjectRoleAuthorizer, SystemAuthorizer};
pub use config::Config;
pub use domain::{Principal, ProjectRole, Role};
pub use error::{CoreError, Result};
pub use session::{SessionService, SessionServiceConfig, ThirdPartyAuthHelper};
