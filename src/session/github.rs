//! GitHub OAuth app adapter

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use super::thirdparty::{http_client, ThirdPartyAuthHelper};
use crate::domain::ThirdPartyIdentity;
use crate::error::{CoreError, Result};

pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Settings for [`GitHubAuthHelper`]
#[derive(Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Users must belong to at least one of these organizations. Empty
    /// means any GitHub user may log in.
    pub allowed_organizations: Vec<String>,
    /// Override for GitHub Enterprise
    pub web_base_url: String,
    /// Override for GitHub Enterprise
    pub api_base_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            allowed_organizations: Vec::new(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("allowed_organizations", &self.allowed_organizations)
            .field("web_base_url", &self.web_base_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct GitHubOrganization {
    login: String,
}

/// [`ThirdPartyAuthHelper`] for GitHub OAuth apps
///
/// Identity is `{id: login, name}`. When organizations are configured, the
/// `read:org` scope is requested and membership is checked on every login.
pub struct GitHubAuthHelper {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    allowed_organizations: Vec<String>,
    web_base_url: String,
    api_base_url: String,
}

impl GitHubAuthHelper {
    pub fn new(config: GitHubConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            client_id: config.client_id,
            client_secret: config.client_secret,
            allowed_organizations: config.allowed_organizations,
            web_base_url: config.web_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn access_token(&self, oauth2_state: &str, oauth2_code: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/login/oauth/access_token", self.web_base_url))
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", oauth2_code),
                ("state", oauth2_state),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("error exchanging OAuth2 code for GitHub access token")?;
        let token: AccessTokenResponse = response
            .json()
            .await
            .context("error decoding GitHub access token response")?;

        // GitHub reports a bad or reused code with a 200 and an error field.
        if let Some(error) = token.error {
            return Err(anyhow!("GitHub rejected the OAuth2 code: {error}"));
        }
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("no access_token field in GitHub response"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, access_token: &str) -> anyhow::Result<T> {
        let url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));
        self.client
            .get(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("error calling GitHub API {path}"))?
            .json()
            .await
            .with_context(|| format!("error decoding GitHub API response {path}"))
    }
}

#[async_trait]
impl ThirdPartyAuthHelper for GitHubAuthHelper {
    fn auth_url(&self, oauth2_state: &str) -> String {
        let base = format!("{}/login/oauth/authorize", self.web_base_url);
        let mut params = vec![("client_id", self.client_id.as_str()), ("state", oauth2_state)];
        if !self.allowed_organizations.is_empty() {
            params.push(("scope", "read:org"));
        }
        match Url::parse_with_params(&base, &params) {
            Ok(url) => url.into(),
            // Only reachable with a malformed base URL override
            Err(_) => base,
        }
    }

    async fn exchange(&self, oauth2_state: &str, oauth2_code: &str) -> Result<ThirdPartyIdentity> {
        let access_token = self.access_token(oauth2_state, oauth2_code).await?;
        let user: GitHubUser = self.get("user", &access_token).await?;

        if !self.allowed_organizations.is_empty() {
            let orgs: Vec<GitHubOrganization> =
                self.get("user/orgs?per_page=100", &access_token).await?;
            let member = orgs.iter().any(|org| {
                self.allowed_organizations
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(&org.login))
            });
            if !member {
                debug!(login = %user.login, "GitHub user is not in an allowed organization");
                return Err(CoreError::authentication(format!(
                    "GitHub user {:?} is not a member of any permitted organization",
                    user.login
                )));
            }
        }

        let name = user
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| user.login.clone());
        Ok(ThirdPartyIdentity {
            id: user.login,
            name,
        })
    }
}
