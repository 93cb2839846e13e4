use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::ThirdPartyIdentity;
use crate::error::Result;

/// Federates user authentication to an OAuth2 identity provider
///
/// Implementations keep every provider-specific rule (claims, organization
/// membership) to themselves. Provider and network failures come back as
/// [`CoreError::Internal`](crate::CoreError::Internal); an identity the
/// provider vouches for but this server won't accept comes back as
/// [`CoreError::Authentication`](crate::CoreError::Authentication).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ThirdPartyAuthHelper: Send + Sync {
    /// URL to send the user's browser to. `oauth2_state` round-trips through
    /// the provider and comes back with the authorization code.
    fn auth_url(&self, oauth2_state: &str) -> String;

    /// Trades an authorization code for the identity of the user
    async fn exchange(&self, oauth2_state: &str, oauth2_code: &str) -> Result<ThirdPartyIdentity>;
}

/// Builds the `reqwest` client shared by the provider adapters
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .user_agent(concat!("orchestra-security/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("error building HTTP client")
}
