//! Session lifecycle: root login, federated login, lookup and logout

use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::ThirdPartyAuthHelper;
use crate::auth::RequestContext;
use crate::crypto::{hash, hash_token, new_token, MIN_TOKEN_LENGTH};
use crate::domain::{
    PrincipalReference, Role, RoleAssignment, Session, ThirdPartyAuthDetails, Token, User,
    UserSessionOptions,
};
use crate::error::{CoreError, Result};
use crate::store::{RoleAssignmentsStore, SessionsStore, UsersStore};

/// The only username accepted for root login
pub const ROOT_USERNAME: &str = "root";

/// Settings for [`SessionService`]
///
/// Moved into [`SessionService::new`]; the root password is hashed there
/// and its clear-text form dropped with the rest of the config.
#[derive(Clone)]
pub struct SessionServiceConfig {
    pub root_user_enabled: bool,
    pub root_user_password: String,
    pub root_user_session_ttl: Duration,
    pub user_session_ttl: Duration,
    /// Users promoted to admin the first time they log in
    pub admin_user_ids: Vec<String>,
    /// Default redirect once federated login completes
    pub auth_success_url: String,
}

impl Default for SessionServiceConfig {
    fn default() -> Self {
        Self {
            root_user_enabled: false,
            root_user_password: String::new(),
            root_user_session_ttl: Duration::hours(1),
            user_session_ttl: Duration::hours(24),
            admin_user_ids: Vec::new(),
            auth_success_url: String::new(),
        }
    }
}

impl fmt::Debug for SessionServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionServiceConfig")
            .field("root_user_enabled", &self.root_user_enabled)
            .field("root_user_password", &"[REDACTED]")
            .field("root_user_session_ttl", &self.root_user_session_ttl)
            .field("user_session_ttl", &self.user_session_ttl)
            .field("admin_user_ids", &self.admin_user_ids)
            .field("auth_success_url", &self.auth_success_url)
            .finish()
    }
}

/// Creates, activates, looks up and deletes sessions
///
/// Third-party authentication is enabled exactly when a
/// [`ThirdPartyAuthHelper`] is supplied.
pub struct SessionService {
    root_user_enabled: bool,
    hashed_root_password: String,
    root_user_session_ttl: Duration,
    user_session_ttl: Duration,
    admin_user_ids: HashSet<String>,
    auth_success_url: String,
    third_party: Option<Arc<dyn ThirdPartyAuthHelper>>,
    sessions: Arc<dyn SessionsStore>,
    users: Arc<dyn UsersStore>,
    role_assignments: Arc<dyn RoleAssignmentsStore>,
}

impl SessionService {
    pub fn new(
        config: SessionServiceConfig,
        third_party: Option<Arc<dyn ThirdPartyAuthHelper>>,
        sessions: Arc<dyn SessionsStore>,
        users: Arc<dyn UsersStore>,
        role_assignments: Arc<dyn RoleAssignmentsStore>,
    ) -> Self {
        Self {
            root_user_enabled: config.root_user_enabled,
            hashed_root_password: hash(ROOT_USERNAME, &config.root_user_password),
            root_user_session_ttl: config.root_user_session_ttl,
            user_session_ttl: config.user_session_ttl,
            admin_user_ids: config.admin_user_ids.into_iter().collect(),
            auth_success_url: config.auth_success_url,
            third_party,
            sessions,
            users,
            role_assignments,
        }
    }

    pub fn third_party_auth_enabled(&self) -> bool {
        self.third_party.is_some()
    }

    fn third_party(&self) -> Result<&dyn ThirdPartyAuthHelper> {
        self.third_party.as_deref().ok_or_else(|| {
            CoreError::not_supported(
                "authentication using a third-party identity provider is not supported",
            )
        })
    }

    /// Logs in as root, returning a bearer token that is never shown again
    pub async fn create_root_session(&self, username: &str, password: &str) -> Result<Token> {
        if !self.root_user_enabled {
            return Err(CoreError::not_supported(
                "authentication using root credentials is not supported",
            ));
        }
        if username != ROOT_USERNAME || hash(username, password) != self.hashed_root_password {
            return Err(CoreError::authentication(
                "could not authenticate request using the supplied credentials",
            ));
        }

        let token = Token {
            value: new_token(MIN_TOKEN_LENGTH),
        };
        let now = Utc::now();
        let session = Session::root(
            hash_token(&token.value),
            now,
            now + self.root_user_session_ttl,
        );
        self.sessions
            .create(&session)
            .await
            .map_err(|e| e.context("error storing new root session"))?;

        info!(session_id = %session.id, "created root session");
        Ok(token)
    }

    /// Starts a federated login
    ///
    /// The returned token only becomes a usable credential once
    /// [`authenticate`](Self::authenticate) completes for the same session.
    pub async fn create_user_session(
        &self,
        opts: &UserSessionOptions,
    ) -> Result<ThirdPartyAuthDetails> {
        let helper = self.third_party()?;

        let oauth2_state = new_token(MIN_TOKEN_LENGTH);
        let token = new_token(MIN_TOKEN_LENGTH);
        let success_url = opts
            .success_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.auth_success_url.clone());
        let session = Session::pending(hash_token(&oauth2_state), hash_token(&token), success_url);
        self.sessions
            .create(&session)
            .await
            .map_err(|e| e.context("error storing new user session"))?;

        debug!(session_id = %session.id, "created pending user session");
        Ok(ThirdPartyAuthDetails {
            auth_url: helper.auth_url(&oauth2_state),
            token,
        })
    }

    /// Completes a federated login and returns where to redirect the user
    ///
    /// Users are created on first login. New users listed in the admin
    /// allow-list are granted ADMIN, PROJECT_CREATOR and READER.
    pub async fn authenticate(&self, oauth2_state: &str, oauth2_code: &str) -> Result<String> {
        let helper = self.third_party()?;

        let session = self
            .sessions
            .get_by_hashed_oauth2_state(&hash_token(oauth2_state))
            .await
            .map_err(|e| e.context("error retrieving session by OAuth2 state"))?;
        if session.is_authenticated() {
            return Err(CoreError::authentication(
                "session has already been authenticated",
            ));
        }

        let identity = helper
            .exchange(oauth2_state, oauth2_code)
            .await
            .map_err(|e| e.context("error completing third-party authentication"))?;

        let user = match self.users.get(&identity.id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => self.create_user(identity.id, identity.name).await?,
            Err(e) => {
                return Err(e.context(format!("error retrieving user {:?}", identity.id)));
            }
        };

        // A concurrent callback for the same state may have won the
        // single-use transition since the check above.
        self.sessions
            .authenticate(&session.id, &user.id, Utc::now() + self.user_session_ttl)
            .await
            .map_err(|e| match e {
                CoreError::Conflict { .. } => {
                    CoreError::authentication("session has already been authenticated")
                }
                e => e.context(format!("error authenticating session {:?}", session.id)),
            })?;

        info!(session_id = %session.id, user_id = %user.id, "authenticated user session");
        Ok(session.auth_success_url)
    }

    async fn create_user(&self, id: String, name: String) -> Result<User> {
        let user = User::new(id, name);
        self.users
            .create(&user)
            .await
            .map_err(|e| e.context(format!("error storing new user {:?}", user.id)))?;
        info!(user_id = %user.id, "created user");

        if self.admin_user_ids.contains(&user.id) {
            for role in [Role::admin(), Role::project_creator(), Role::reader()] {
                let assignment = RoleAssignment {
                    role,
                    principal: PrincipalReference::user(user.id.clone()),
                };
                self.role_assignments.grant(&assignment).await.map_err(|e| {
                    e.context(format!(
                        "error granting role {} to user {:?}",
                        assignment.role, user.id
                    ))
                })?;
            }
            info!(user_id = %user.id, "granted admin roles to new user");
        }
        Ok(user)
    }

    /// Looks a session up by its clear-text token
    ///
    /// A missing session is an authentication failure, so callers can't
    /// learn whether a token ever existed.
    pub async fn get_by_token(&self, token: &str) -> Result<Session> {
        self.sessions
            .get_by_hashed_token(&hash_token(token))
            .await
            .map_err(|e| e.into_authentication("session not found"))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.delete(id).await
    }

    /// Logs out the session that authenticated the current request
    pub async fn delete_current(&self, ctx: &RequestContext) -> Result<()> {
        let id = ctx.session_id.as_deref().ok_or_else(|| {
            CoreError::bad_request("the request was not authenticated with a session token")
        })?;
        self.delete(id).await?;
        info!(session_id = %id, "deleted session");
        Ok(())
    }
}
