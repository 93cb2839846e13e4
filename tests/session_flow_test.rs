//! End-to-end flows across the session service, token filter, authorizers
//! and services, backed by the in-memory stores.

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use orchestra_security::authz::Authorizer;
use orchestra_security::crypto::hash_token;
use orchestra_security::domain::{
    Event, Principal, PrincipalReference, Role, RoleAssignment, ServiceAccount,
    ThirdPartyIdentity, User, UserSessionOptions,
};
use orchestra_security::services::{ServiceAccountsService, UsersService};
use orchestra_security::store::memory::MemorySessionsStore;
use orchestra_security::store::{RoleAssignmentsStore, SessionsStore, UsersStore};
use orchestra_security::{CoreError, RequestContext, ThirdPartyAuthHelper};

use common::*;

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn test_root_login_logout() {
    let stores = Stores::new();
    let sessions = stores.session_service(None, &[]);
    let filter = stores.token_auth_filter(true, false);

    let token = sessions
        .create_root_session("root", ROOT_PASSWORD)
        .await
        .unwrap();
    let ctx = filter.authenticate(Some(&bearer(&token.value))).await.unwrap();
    assert_eq!(ctx.principal, Some(Principal::Root));
    assert!(ctx.session_id.is_some());

    stores
        .system_authorizer()
        .authorize(ctx.principal(), &[Role::admin()])
        .await
        .unwrap();

    sessions.delete_current(&ctx).await.unwrap();
    let err = filter
        .authenticate(Some(&bearer(&token.value)))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_root_sessions_rejected_once_root_is_disabled() {
    let stores = Stores::new();
    let token = stores
        .session_service(None, &[])
        .create_root_session("root", ROOT_PASSWORD)
        .await
        .unwrap();

    let err = stores
        .token_auth_filter(false, false)
        .authenticate(Some(&bearer(&token.value)))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_federated_login() {
    let stores = Stores::new();
    let idp = fake_idp("new@x.com", "New User");
    let sessions = stores.session_service(idp, &[]);
    let filter = stores.token_auth_filter(false, true);

    let details = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap();
    assert!(details.auth_url.starts_with(FAKE_IDP_AUTHORIZE));

    // Not usable until the provider calls back.
    let err = filter
        .authenticate(Some(&bearer(&details.token)))
        .await
        .unwrap_err();
    assert!(err.is_authentication());

    let state = state_from_auth_url(&details.auth_url);
    let redirect = sessions.authenticate(&state, GOOD_CODE).await.unwrap();
    assert_eq!(redirect, AUTH_SUCCESS_URL);

    let ctx = filter
        .authenticate(Some(&bearer(&details.token)))
        .await
        .unwrap();
    assert!(matches!(ctx.principal, Some(Principal::User(ref u)) if u.id == "new@x.com"));

    // New users hold no roles.
    assert!(stores.role_assignments.is_empty().await);
    let err = stores
        .system_authorizer()
        .authorize(ctx.principal(), &[Role::reader()])
        .await
        .unwrap_err();
    assert!(err.is_authorization());

    // The state is single use.
    let err = sessions.authenticate(&state, GOOD_CODE).await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(stores.users.list().await.unwrap().len(), 1);

    let session = sessions.get_by_token(&details.token).await.unwrap();
    assert_eq!(session.user_id.as_deref(), Some("new@x.com"));
}

#[tokio::test]
async fn test_state_is_single_use() {
    let stores = Stores::new();
    let sessions = stores.session_service(fake_idp("new@x.com", "New User"), &[]);

    let details = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap();
    let state = state_from_auth_url(&details.auth_url);
    sessions.authenticate(&state, GOOD_CODE).await.unwrap();
    let activated = sessions.get_by_token(&details.token).await.unwrap();

    let err = sessions.authenticate(&state, GOOD_CODE).await.unwrap_err();
    assert!(err.is_authentication(), "{err:?}");

    assert_eq!(stores.users.list().await.unwrap().len(), 1);
    let session = sessions.get_by_token(&details.token).await.unwrap();
    assert_eq!(session.authenticated, activated.authenticated);
    assert_eq!(session.expires, activated.expires);
}

/// Provider whose exchange lets a competing callback for the same state
/// activate the session first
struct RacingIdentityProvider {
    sessions: Arc<MemorySessionsStore>,
}

#[async_trait]
impl ThirdPartyAuthHelper for RacingIdentityProvider {
    fn auth_url(&self, oauth2_state: &str) -> String {
        format!("{FAKE_IDP_AUTHORIZE}?state={oauth2_state}")
    }

    async fn exchange(
        &self,
        oauth2_state: &str,
        _oauth2_code: &str,
    ) -> orchestra_security::Result<ThirdPartyIdentity> {
        let session = self
            .sessions
            .get_by_hashed_oauth2_state(&hash_token(oauth2_state))
            .await?;
        self.sessions
            .authenticate(&session.id, "winner", Utc::now() + Duration::hours(1))
            .await?;
        Ok(ThirdPartyIdentity {
            id: "loser".to_string(),
            name: "Loser".to_string(),
        })
    }
}

#[tokio::test]
async fn test_concurrent_callback_loses_with_authentication_error() {
    let stores = Stores::new();
    let idp: Arc<dyn ThirdPartyAuthHelper> = Arc::new(RacingIdentityProvider {
        sessions: stores.sessions.clone(),
    });
    let sessions = stores.session_service(Some(idp), &[]);

    let details = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap();
    let err = sessions
        .authenticate(&state_from_auth_url(&details.auth_url), GOOD_CODE)
        .await
        .unwrap_err();
    assert!(err.is_authentication(), "{err:?}");

    // The winning callback keeps the session.
    let session = sessions.get_by_token(&details.token).await.unwrap();
    assert_eq!(session.user_id.as_deref(), Some("winner"));
}

#[tokio::test]
async fn test_first_login_of_admin() {
    let stores = Stores::new();
    let idp = fake_idp("tony@starkindustries.com", "Tony Stark");
    let sessions = stores.session_service(idp, &["tony@starkindustries.com"]);

    let details = sessions
        .create_user_session(&UserSessionOptions {
            success_url: Some("https://orchestra.example.com/projects".to_string()),
        })
        .await
        .unwrap();
    let redirect = sessions
        .authenticate(&state_from_auth_url(&details.auth_url), GOOD_CODE)
        .await
        .unwrap();
    assert_eq!(redirect, "https://orchestra.example.com/projects");

    for role in [Role::admin(), Role::project_creator(), Role::reader()] {
        let assignment = RoleAssignment {
            role,
            principal: PrincipalReference::user("tony@starkindustries.com"),
        };
        assert!(stores.role_assignments.exists(&assignment).await.unwrap());
    }
}

#[tokio::test]
async fn test_unknown_state_creates_nothing() {
    let stores = Stores::new();
    let idp = fake_idp("new@x.com", "New User");
    let sessions = stores.session_service(idp, &[]);

    let err = sessions.authenticate("foo", "bar").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(stores.users.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_code_leaves_session_pending() {
    let stores = Stores::new();
    let idp = fake_idp("new@x.com", "New User");
    let sessions = stores.session_service(idp, &[]);

    let details = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap();
    let state = state_from_auth_url(&details.auth_url);

    let err = sessions.authenticate(&state, "bad-code").await.unwrap_err();
    assert!(err.is_authentication());
    assert!(stores.users.list().await.unwrap().is_empty());

    // A later, valid callback still completes the login.
    sessions.authenticate(&state, GOOD_CODE).await.unwrap();
}

#[tokio::test]
async fn test_user_sessions_need_third_party_auth() {
    let stores = Stores::new();
    let sessions = stores.session_service(None, &[]);

    let err = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotSupported { .. }));
    assert!(stores.sessions.is_empty().await);

    let err = sessions.authenticate("foo", "bar").await.unwrap_err();
    assert!(matches!(err, CoreError::NotSupported { .. }));
}

#[tokio::test]
async fn test_locking_a_user_ends_their_sessions() {
    let stores = Stores::new();
    let idp = fake_idp("bruce", "Bruce Banner");
    let sessions = stores.session_service(idp, &[]);
    let filter = stores.token_auth_filter(true, true);
    let users = UsersService::new(
        Arc::new(stores.system_authorizer()),
        stores.users.clone(),
        stores.sessions.clone(),
    );

    let details = sessions
        .create_user_session(&UserSessionOptions::default())
        .await
        .unwrap();
    sessions
        .authenticate(&state_from_auth_url(&details.auth_url), GOOD_CODE)
        .await
        .unwrap();
    filter
        .authenticate(Some(&bearer(&details.token)))
        .await
        .unwrap();

    users
        .lock(&RequestContext::for_principal(Principal::Root), "bruce")
        .await
        .unwrap();
    let err = filter
        .authenticate(Some(&bearer(&details.token)))
        .await
        .unwrap_err();
    assert!(err.is_authentication());

    users
        .unlock(&RequestContext::for_principal(Principal::Root), "bruce")
        .await
        .unwrap();
    let user: User = users
        .get(&RequestContext::for_principal(Principal::Root), "bruce")
        .await
        .unwrap();
    assert!(!user.is_locked());
}

#[tokio::test]
async fn test_service_account_lifecycle() {
    let stores = Stores::new();
    let filter = stores.token_auth_filter(false, false);
    let service_accounts = ServiceAccountsService::new(
        Arc::new(stores.system_authorizer()),
        stores.service_accounts.clone(),
    );
    let root = RequestContext::for_principal(Principal::Root);

    let token = service_accounts
        .create(&root, ServiceAccount::new("jarvis", "home automation"))
        .await
        .unwrap();
    let ctx = filter.authenticate(Some(&bearer(&token.value))).await.unwrap();
    assert!(matches!(ctx.principal, Some(Principal::ServiceAccount(ref sa)) if sa.id == "jarvis"));

    service_accounts.lock(&root, "jarvis").await.unwrap();
    let err = filter
        .authenticate(Some(&bearer(&token.value)))
        .await
        .unwrap_err();
    assert!(err.is_authorization());

    let new_token = service_accounts.unlock(&root, "jarvis").await.unwrap();
    assert_ne!(new_token, token);
    let err = filter
        .authenticate(Some(&bearer(&token.value)))
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    filter
        .authenticate(Some(&bearer(&new_token.value)))
        .await
        .unwrap();

    let err = service_accounts
        .create(&root, ServiceAccount::new("jarvis", "again"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[tokio::test]
async fn test_worker_token() {
    let stores = Stores::new();
    stores
        .events
        .insert(
            hash_token("worker-token"),
            Event {
                id: "e1".to_string(),
                project_id: "italian".to_string(),
            },
        )
        .await;

    let ctx = stores
        .token_auth_filter(false, false)
        .authenticate(Some("Bearer worker-token"))
        .await
        .unwrap();
    assert_eq!(ctx.principal, Some(Principal::worker("e1")));

    let authz = stores.system_authorizer();
    authz
        .authorize(ctx.principal(), &[Role::worker("e1")])
        .await
        .unwrap();
    assert!(authz
        .authorize(ctx.principal(), &[Role::worker("e2")])
        .await
        .is_err());
}

#[tokio::test]
async fn test_store_backed_user_roles() {
    let stores = Stores::new();
    stores
        .users
        .create(&User::new("tony", "Tony Stark"))
        .await
        .unwrap();
    stores
        .role_assignments
        .grant(&RoleAssignment {
            role: Role::event_creator("*"),
            principal: PrincipalReference::user("tony"),
        })
        .await
        .unwrap();

    let tony = Principal::User(User::new("tony", "Tony Stark"));
    stores
        .system_authorizer()
        .authorize(Some(&tony), &[Role::event_creator("github")])
        .await
        .unwrap();
}
