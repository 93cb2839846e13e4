//! Principal resolution from a bearer token

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use super::RequestContext;
use crate::crypto::hash_token;
use crate::domain::Principal;
use crate::error::{CoreError, Result};
use crate::store::{EventsStore, ServiceAccountsStore, SessionsStore, UsersStore};

const BEARER_PREFIX: &str = "Bearer ";

/// Settings for [`TokenAuthFilter`]
///
/// The scheduler and observer secrets are moved into
/// [`TokenAuthFilter::new`], hashed, and dropped.
#[derive(Clone, Default)]
pub struct TokenAuthFilterConfig {
    /// Whether root sessions are honored
    pub root_user_enabled: bool,
    /// Whether user sessions created through third-party auth are honored
    pub third_party_auth_enabled: bool,
    pub scheduler_token: String,
    pub observer_token: String,
}

impl fmt::Debug for TokenAuthFilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthFilterConfig")
            .field("root_user_enabled", &self.root_user_enabled)
            .field("third_party_auth_enabled", &self.third_party_auth_enabled)
            .field("scheduler_token", &"[REDACTED]")
            .field("observer_token", &"[REDACTED]")
            .finish()
    }
}

/// Resolves an `Authorization` header into a [`RequestContext`]
///
/// Performs store reads only; never writes.
pub struct TokenAuthFilter {
    root_user_enabled: bool,
    third_party_auth_enabled: bool,
    hashed_scheduler_token: String,
    hashed_observer_token: String,
    events: Arc<dyn EventsStore>,
    service_accounts: Arc<dyn ServiceAccountsStore>,
    sessions: Arc<dyn SessionsStore>,
    users: Arc<dyn UsersStore>,
}

impl TokenAuthFilter {
    pub fn new(
        config: TokenAuthFilterConfig,
        events: Arc<dyn EventsStore>,
        service_accounts: Arc<dyn ServiceAccountsStore>,
        sessions: Arc<dyn SessionsStore>,
        users: Arc<dyn UsersStore>,
    ) -> Self {
        Self {
            root_user_enabled: config.root_user_enabled,
            third_party_auth_enabled: config.third_party_auth_enabled,
            hashed_scheduler_token: hash_token(&config.scheduler_token),
            hashed_observer_token: hash_token(&config.observer_token),
            events,
            service_accounts,
            sessions,
            users,
        }
    }

    /// Resolves the value of an `Authorization` header
    ///
    /// Store not-founds move on to the next credential kind. Any other store
    /// failure aborts resolution with an internal error.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<RequestContext> {
        let token = bearer_token(authorization)?;
        let hashed = hash_token(token);

        if hashed == self.hashed_scheduler_token {
            debug!(principal = "scheduler", "resolved principal");
            return Ok(RequestContext::for_principal(Principal::Scheduler));
        }
        if hashed == self.hashed_observer_token {
            debug!(principal = "observer", "resolved principal");
            return Ok(RequestContext::for_principal(Principal::Observer));
        }

        match self.events.get_by_hashed_worker_token(&hashed).await {
            Ok(event) => {
                debug!(principal = "worker", event_id = %event.id, "resolved principal");
                return Ok(RequestContext::for_principal(Principal::worker(event.id)));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(fatal(e, "event by worker token")),
        }

        match self.service_accounts.get_by_hashed_token(&hashed).await {
            Ok(sa) if sa.is_locked() => {
                debug!(service_account_id = %sa.id, "rejected locked service account");
                return Err(CoreError::authorization("service account is locked"));
            }
            Ok(sa) => {
                debug!(principal = "service_account", service_account_id = %sa.id, "resolved principal");
                return Ok(RequestContext::for_principal(Principal::ServiceAccount(sa)));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(fatal(e, "service account by token")),
        }

        let session = match self.sessions.get_by_hashed_token(&hashed).await {
            Ok(session) => session,
            Err(e) if e.is_not_found() => {
                return Err(CoreError::authentication("session not found or expired"))
            }
            Err(e) => return Err(fatal(e, "session by token")),
        };

        if session.root && !self.root_user_enabled {
            return Err(CoreError::authentication(
                "token belongs to a root session, but root authentication is disabled",
            ));
        }
        if !session.root && !self.third_party_auth_enabled {
            return Err(CoreError::authentication(
                "token belongs to a user session, but third-party authentication is disabled",
            ));
        }
        if !session.is_authenticated() {
            return Err(CoreError::authentication(
                "session has not been authenticated; please log in again",
            ));
        }
        if session.is_expired_at(Utc::now()) {
            return Err(CoreError::authentication(
                "session has expired; please log in again",
            ));
        }

        if session.root {
            debug!(principal = "root", session_id = %session.id, "resolved principal");
            return Ok(RequestContext::for_session(Principal::Root, session.id));
        }

        let Some(user_id) = session.user_id.as_deref() else {
            error!(session_id = %session.id, "authenticated user session has no user");
            return Err(CoreError::Internal(anyhow::anyhow!(
                "authenticated session {:?} has no user",
                session.id
            )));
        };
        let user = match self.users.get(user_id).await {
            Ok(user) => user,
            Err(e) => return Err(fatal(e, "session user")),
        };
        if user.is_locked() {
            debug!(user_id = %user.id, "rejected locked user");
            return Err(CoreError::authorization("user is locked"));
        }

        debug!(principal = "user", user_id = %user.id, session_id = %session.id, "resolved principal");
        Ok(RequestContext::for_session(Principal::User(user), session.id))
    }
}

/// Extracts the token from `Bearer <token>`
fn bearer_token(authorization: Option<&str>) -> Result<&str> {
    let header =
        authorization.ok_or_else(|| CoreError::authentication("missing Authorization header"))?;
    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty() && !token.contains(char::is_whitespace))
        .ok_or_else(|| {
            CoreError::authentication("Authorization header must be of the form \"Bearer <token>\"")
        })
}

/// Logs a lookup failure and classifies it as internal
fn fatal(err: CoreError, lookup: &'static str) -> CoreError {
    error!(lookup, error = %err, "error resolving principal");
    let err = match err {
        CoreError::Internal(inner) => inner,
        other => anyhow::Error::new(other),
    };
    CoreError::Internal(err.context(format!("error looking up {lookup}")))
}
