//! Sessions and third-party (OAuth2) federation
//!
//! A federated session moves through three states:
//!
//! ```text
//! create_user_session ──► pending ──authenticate──► active ──expiry / delete──► gone
//! ```
//!
//! Nothing moves a session back to pending and nothing skips
//! `authenticate`. Root sessions are created active.

mod github;
mod oidc;
mod service;
mod thirdparty;

pub use github::{GitHubAuthHelper, GitHubConfig, DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL};
pub use oidc::{IdTokenClaims, IdTokenVerifier, JwksVerifier, OidcAuthHelper, OidcConfig, OidcProvider};
pub use service::{SessionService, SessionServiceConfig, ROOT_USERNAME};
#[cfg(test)]
pub use thirdparty::MockThirdPartyAuthHelper;
pub use thirdparty::ThirdPartyAuthHelper;
