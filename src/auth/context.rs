use crate::domain::Principal;

/// Per-request authentication result, threaded explicitly to services
///
/// Produced by [`TokenAuthFilter`](super::TokenAuthFilter) and stored in the
/// request's extensions by [`auth_middleware`](super::auth_middleware).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    /// Set when the credential was a session token (root or user)
    pub session_id: Option<String>,
}

impl RequestContext {
    /// A context with no principal. Every authorization check fails.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            session_id: None,
        }
    }

    pub fn for_session(principal: Principal, session_id: impl Into<String>) -> Self {
        Self {
            principal: Some(principal),
            session_id: Some(session_id.into()),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}
