use std::sync::Arc;
use tracing::info;

use crate::auth::RequestContext;
use crate::authz::Authorizer;
use crate::domain::{Role, User};
use crate::error::Result;
use crate::store::{SessionsStore, UsersStore};

pub struct UsersService {
    authorizer: Arc<dyn Authorizer>,
    users: Arc<dyn UsersStore>,
    sessions: Arc<dyn SessionsStore>,
}

impl UsersService {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        users: Arc<dyn UsersStore>,
        sessions: Arc<dyn SessionsStore>,
    ) -> Self {
        Self {
            authorizer,
            users,
            sessions,
        }
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<User> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::reader()])
            .await?;
        self.users.get(id).await
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::reader()])
            .await?;
        self.users.list().await
    }

    /// Locks a user out and ends all of their sessions
    pub async fn lock(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        self.users.lock(id).await?;
        self.sessions
            .delete_by_user(id)
            .await
            .map_err(|e| e.context(format!("error deleting sessions of user {id:?}")))?;
        info!(user_id = %id, "locked user");
        Ok(())
    }

    pub async fn unlock(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        self.users.unlock(id).await?;
        info!(user_id = %id, "unlocked user");
        Ok(())
    }
}
