//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use orchestra_security::auth::{TokenAuthFilter, TokenAuthFilterConfig};
use orchestra_security::authz::{ProjectRoleAuthorizer, SystemAuthorizer};
use orchestra_security::domain::ThirdPartyIdentity;
use orchestra_security::session::{SessionService, SessionServiceConfig, ThirdPartyAuthHelper};
use orchestra_security::store::memory::{
    MemoryEventsStore, MemoryProjectRoleAssignmentsStore, MemoryRoleAssignmentsStore,
    MemoryServiceAccountsStore, MemorySessionsStore, MemoryUsersStore,
};
use orchestra_security::CoreError;

pub const SCHEDULER_TOKEN: &str = "scheduler-shared-secret";
pub const OBSERVER_TOKEN: &str = "observer-shared-secret";
pub const ROOT_PASSWORD: &str = "yourenotgonnaguessthis";
pub const GOOD_CODE: &str = "good-code";
pub const AUTH_SUCCESS_URL: &str = "https://orchestra.example.com/welcome";
pub const FAKE_IDP_AUTHORIZE: &str = "https://idp.example.com/authorize";

/// Identity provider that accepts exactly one authorization code
pub struct FakeIdentityProvider {
    pub identity: ThirdPartyIdentity,
}

impl FakeIdentityProvider {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            identity: ThirdPartyIdentity {
                id: id.to_string(),
                name: name.to_string(),
            },
        }
    }
}

#[async_trait]
impl ThirdPartyAuthHelper for FakeIdentityProvider {
    fn auth_url(&self, oauth2_state: &str) -> String {
        format!("{FAKE_IDP_AUTHORIZE}?state={oauth2_state}")
    }

    async fn exchange(
        &self,
        _oauth2_state: &str,
        oauth2_code: &str,
    ) -> orchestra_security::Result<ThirdPartyIdentity> {
        if oauth2_code == GOOD_CODE {
            Ok(self.identity.clone())
        } else {
            Err(CoreError::authentication("the identity provider rejected the code"))
        }
    }
}

/// A [`FakeIdentityProvider`] ready to hand to [`Stores::session_service`]
pub fn fake_idp(id: &str, name: &str) -> Option<Arc<dyn ThirdPartyAuthHelper>> {
    Some(Arc::new(FakeIdentityProvider::new(id, name)))
}

/// Pulls the OAuth2 state back out of a URL built by [`FakeIdentityProvider`]
pub fn state_from_auth_url(auth_url: &str) -> String {
    auth_url
        .split_once("state=")
        .map(|(_, state)| state.to_string())
        .unwrap()
}

/// In-memory stores shared by every component under test
#[derive(Clone, Default)]
pub struct Stores {
    pub events: Arc<MemoryEventsStore>,
    pub sessions: Arc<MemorySessionsStore>,
    pub users: Arc<MemoryUsersStore>,
    pub service_accounts: Arc<MemoryServiceAccountsStore>,
    pub role_assignments: Arc<MemoryRoleAssignmentsStore>,
    pub project_role_assignments: Arc<MemoryProjectRoleAssignmentsStore>,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_auth_filter(&self, root_user_enabled: bool, third_party: bool) -> TokenAuthFilter {
        TokenAuthFilter::new(
            TokenAuthFilterConfig {
                root_user_enabled,
                third_party_auth_enabled: third_party,
                scheduler_token: SCHEDULER_TOKEN.to_string(),
                observer_token: OBSERVER_TOKEN.to_string(),
            },
            self.events.clone(),
            self.service_accounts.clone(),
            self.sessions.clone(),
            self.users.clone(),
        )
    }

    pub fn session_service(
        &self,
        third_party: Option<Arc<dyn ThirdPartyAuthHelper>>,
        admin_user_ids: &[&str],
    ) -> SessionService {
        SessionService::new(
            SessionServiceConfig {
                root_user_enabled: true,
                root_user_password: ROOT_PASSWORD.to_string(),
                root_user_session_ttl: Duration::hours(1),
                user_session_ttl: Duration::hours(24),
                admin_user_ids: admin_user_ids.iter().map(|id| id.to_string()).collect(),
                auth_success_url: AUTH_SUCCESS_URL.to_string(),
            },
            third_party,
            self.sessions.clone(),
            self.users.clone(),
            self.role_assignments.clone(),
        )
    }

    pub fn system_authorizer(&self) -> SystemAuthorizer {
        SystemAuthorizer::new(self.role_assignments.clone())
    }

    pub fn project_authorizer(&self) -> ProjectRoleAuthorizer {
        ProjectRoleAuthorizer::new(self.project_role_assignments.clone())
    }
}
