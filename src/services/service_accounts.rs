use std::sync::Arc;
use tracing::info;

use crate::auth::RequestContext;
use crate::authz::Authorizer;
use crate::crypto::{hash_token, new_token, MIN_TOKEN_LENGTH};
use crate::domain::{Role, ServiceAccount, Token};
use crate::error::{CoreError, Result};
use crate::store::ServiceAccountsStore;

/// Non-human principals that authenticate with a long-lived token
///
/// A token is returned in clear text exactly once, on `create` or
/// `unlock`. Only its hash is stored.
pub struct ServiceAccountsService {
    authorizer: Arc<dyn Authorizer>,
    service_accounts: Arc<dyn ServiceAccountsStore>,
}

impl ServiceAccountsService {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        service_accounts: Arc<dyn ServiceAccountsStore>,
    ) -> Self {
        Self {
            authorizer,
            service_accounts,
        }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        mut service_account: ServiceAccount,
    ) -> Result<Token> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        if service_account.id.trim().is_empty() {
            return Err(CoreError::bad_request("service account id must not be empty"));
        }

        let token = Token {
            value: new_token(MIN_TOKEN_LENGTH),
        };
        service_account.hashed_token = hash_token(&token.value);
        service_account.locked = None;
        self.service_accounts.create(&service_account).await?;

        info!(service_account_id = %service_account.id, "created service account");
        Ok(token)
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<ServiceAccount> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::reader()])
            .await?;
        self.service_accounts.get(id).await
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<ServiceAccount>> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::reader()])
            .await?;
        self.service_accounts.list().await
    }

    pub async fn lock(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        self.service_accounts.lock(id).await?;
        info!(service_account_id = %id, "locked service account");
        Ok(())
    }

    /// Unlocks a service account, replacing its token
    pub async fn unlock(&self, ctx: &RequestContext, id: &str) -> Result<Token> {
        self.authorizer
            .authorize(ctx.principal(), &[Role::admin()])
            .await?;
        let token = Token {
            value: new_token(MIN_TOKEN_LENGTH),
        };
        self.service_accounts
            .unlock(id, &hash_token(&token.value))
            .await?;
        info!(service_account_id = %id, "unlocked service account");
        Ok(token)
    }
}
