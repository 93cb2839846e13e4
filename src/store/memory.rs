//! In-memory store implementations
//!
//! Suitable for tests and local development. Production deployments plug in
//! their own persistent implementations of the traits in
//! [`super::traits`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::traits::{
    EventsStore, ProjectRoleAssignmentsStore, RoleAssignmentsStore, ServiceAccountsStore,
    SessionsStore, UsersStore,
};
use crate::domain::{
    Event, ProjectRoleAssignment, ProjectRoleAssignmentsSelector, RoleAssignment,
    RoleAssignmentsSelector, ServiceAccount, Session, User,
};
use crate::error::{CoreError, Result};

/// How long, in seconds, a federated login may stay pending before it is
/// discarded
pub const DEFAULT_PENDING_SESSION_TTL_SECS: i64 = 3600;

/// Sessions held in memory
///
/// Pending sessions older than the pending TTL can no longer be completed
/// and, like expired active sessions, are swept on every `create`, so
/// abandoned logins don't accumulate.
#[derive(Debug)]
pub struct MemorySessionsStore {
    sessions: RwLock<HashMap<String, Session>>,
    pending_ttl: Duration,
}

impl Default for MemorySessionsStore {
    fn default() -> Self {
        Self::with_pending_ttl(Duration::seconds(DEFAULT_PENDING_SESSION_TTL_SECS))
    }
}

impl MemorySessionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_ttl(pending_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            pending_ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    fn is_stale(&self, session: &Session, now: DateTime<Utc>) -> bool {
        if session.is_authenticated() {
            session.is_expired_at(now)
        } else {
            session.created + self.pending_ttl < now
        }
    }
}

#[async_trait]
impl SessionsStore for MemorySessionsStore {
    async fn create(&self, session: &Session) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !self.is_stale(s, now));
        if sessions.contains_key(&session.id) {
            return Err(CoreError::conflict(
                "Session",
                &session.id,
                "a session with this id already exists",
            ));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_by_hashed_oauth2_state(&self, hashed_oauth2_state: &str) -> Result<Session> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|s| !hashed_oauth2_state.is_empty() && s.hashed_oauth2_state == hashed_oauth2_state)
            .filter(|s| s.is_authenticated() || !self.is_stale(s, now))
            .cloned()
            .ok_or_else(|| CoreError::not_found("Session", "<oauth2 state>"))
    }

    async fn get_by_hashed_token(&self, hashed_token: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|s| !hashed_token.is_empty() && s.hashed_token == hashed_token)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Session", "<token>"))
    }

    async fn authenticate(
        &self,
        session_id: &str,
        user_id: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        // The write lock makes the pending -> active check-and-set atomic.
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoreError::not_found("Session", session_id))?;
        if session.authenticated.is_some() {
            return Err(CoreError::conflict(
                "Session",
                session_id,
                "session is already authenticated",
            ));
        }
        session.user_id = Some(user_id.to_string());
        session.authenticated = Some(Utc::now());
        session.expires = Some(expires);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("Session", id))
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<()> {
        self.sessions
            .write()
            .await
            .retain(|_, s| s.user_id.as_deref() != Some(user_id));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUsersStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUsersStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersStore for MemoryUsersStore {
    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(CoreError::conflict(
                "User",
                &user.id,
                "a user with this id already exists",
            ));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("User", id))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn lock(&self, id: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("User", id))?;
        user.locked = Some(Utc::now());
        Ok(())
    }

    async fn unlock(&self, id: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("User", id))?;
        user.locked = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryServiceAccountsStore {
    service_accounts: RwLock<HashMap<String, ServiceAccount>>,
}

impl MemoryServiceAccountsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceAccountsStore for MemoryServiceAccountsStore {
    async fn create(&self, service_account: &ServiceAccount) -> Result<()> {
        let mut accounts = self.service_accounts.write().await;
        if accounts.contains_key(&service_account.id) {
            return Err(CoreError::conflict(
                "ServiceAccount",
                &service_account.id,
                "a service account with this id already exists",
            ));
        }
        accounts.insert(service_account.id.clone(), service_account.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<ServiceAccount> {
        self.service_accounts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("ServiceAccount", id))
    }

    async fn get_by_hashed_token(&self, hashed_token: &str) -> Result<ServiceAccount> {
        self.service_accounts
            .read()
            .await
            .values()
            .find(|sa| !hashed_token.is_empty() && sa.hashed_token == hashed_token)
            .cloned()
            .ok_or_else(|| CoreError::not_found("ServiceAccount", "<token>"))
    }

    async fn list(&self) -> Result<Vec<ServiceAccount>> {
        let mut accounts: Vec<ServiceAccount> = self
            .service_accounts
            .read()
            .await
            .values()
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn lock(&self, id: &str) -> Result<()> {
        let mut accounts = self.service_accounts.write().await;
        let sa = accounts
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("ServiceAccount", id))?;
        sa.locked = Some(Utc::now());
        Ok(())
    }

    async fn unlock(&self, id: &str, new_hashed_token: &str) -> Result<()> {
        let mut accounts = self.service_accounts.write().await;
        let sa = accounts
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("ServiceAccount", id))?;
        sa.locked = None;
        sa.hashed_token = new_hashed_token.to_string();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRoleAssignmentsStore {
    assignments: RwLock<HashSet<RoleAssignment>>,
}

impl MemoryRoleAssignmentsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.assignments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assignments.read().await.is_empty()
    }
}

#[async_trait]
impl RoleAssignmentsStore for MemoryRoleAssignmentsStore {
    async fn grant(&self, assignment: &RoleAssignment) -> Result<()> {
        self.assignments.write().await.insert(assignment.clone());
        Ok(())
    }

    async fn revoke(&self, assignment: &RoleAssignment) -> Result<()> {
        self.assignments.write().await.remove(assignment);
        Ok(())
    }

    async fn revoke_many(&self, selector: &RoleAssignmentsSelector) -> Result<()> {
        self.assignments
            .write()
            .await
            .retain(|a| !selector.selects(a));
        Ok(())
    }

    async fn exists(&self, assignment: &RoleAssignment) -> Result<bool> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .any(|held| held.principal == assignment.principal && held.role.matches(&assignment.role)))
    }
}

#[derive(Debug, Default)]
pub struct MemoryProjectRoleAssignmentsStore {
    assignments: RwLock<HashSet<ProjectRoleAssignment>>,
}

impl MemoryProjectRoleAssignmentsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.assignments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assignments.read().await.is_empty()
    }
}

#[async_trait]
impl ProjectRoleAssignmentsStore for MemoryProjectRoleAssignmentsStore {
    async fn grant(&self, assignment: &ProjectRoleAssignment) -> Result<()> {
        self.assignments.write().await.insert(assignment.clone());
        Ok(())
    }

    async fn revoke(&self, assignment: &ProjectRoleAssignment) -> Result<()> {
        self.assignments.write().await.remove(assignment);
        Ok(())
    }

    async fn revoke_many(&self, selector: &ProjectRoleAssignmentsSelector) -> Result<()> {
        self.assignments
            .write()
            .await
            .retain(|a| !selector.selects(a));
        Ok(())
    }

    async fn exists(&self, assignment: &ProjectRoleAssignment) -> Result<bool> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .any(|held| held.principal == assignment.principal && held.role.matches(&assignment.role)))
    }
}

/// Events indexed by the hash of their worker token
#[derive(Debug, Default)]
pub struct MemoryEventsStore {
    by_hashed_worker_token: RwLock<HashMap<String, Event>>,
}

impl MemoryEventsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, hashed_worker_token: impl Into<String>, event: Event) {
        self.by_hashed_worker_token
            .write()
            .await
            .insert(hashed_worker_token.into(), event);
    }
}

#[async_trait]
impl EventsStore for MemoryEventsStore {
    async fn get_by_hashed_worker_token(&self, hashed_worker_token: &str) -> Result<Event> {
        self.by_hashed_worker_token
            .read()
            .await
            .get(hashed_worker_token)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Event", "<worker token>"))
    }
}
