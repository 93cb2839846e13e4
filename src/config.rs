//! Configuration loaded from environment variables
//!
//! | Variable | Meaning |
//! |---|---|
//! | `ROOT_USER_ENABLED` | allow root login (`true`/`false`, default `false`) |
//! | `ROOT_USER_PASSWORD` | required when root login is enabled |
//! | `ROOT_USER_SESSION_TTL` | seconds, default 3600 |
//! | `THIRD_PARTY_AUTH_HELPER` | `disabled` (default), `oidc` or `github` |
//! | `USER_SESSION_TTL` | seconds, default 86400 |
//! | `ADMIN_USER_IDS` | comma separated, promoted on first login |
//! | `AUTH_SUCCESS_URL` | default redirect after federated login |
//! | `OIDC_PROVIDER_URL`, `OIDC_CLIENT_ID`, `OIDC_CLIENT_SECRET`, `OIDC_REDIRECT_URL` | OpenID Connect |
//! | `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`, `GITHUB_ALLOWED_ORGANIZATIONS` | GitHub |
//! | `GITHUB_WEB_BASE_URL`, `GITHUB_API_BASE_URL` | GitHub Enterprise overrides |
//! | `SCHEDULER_TOKEN`, `OBSERVER_TOKEN` | required shared secrets |

use anyhow::{anyhow, bail, Context};
use chrono::Duration;
use std::fmt;
use std::sync::Arc;

use crate::auth::TokenAuthFilterConfig;
use crate::session::{
    GitHubAuthHelper, GitHubConfig, OidcAuthHelper, OidcConfig, SessionServiceConfig,
    ThirdPartyAuthHelper, DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL,
};

const DEFAULT_ROOT_USER_SESSION_TTL_SECS: i64 = 3600;
const DEFAULT_USER_SESSION_TTL_SECS: i64 = 86400;

/// Which identity provider, if any, federates user logins
#[derive(Debug, Clone)]
pub enum ThirdPartyAuthConfig {
    Disabled,
    Oidc(OidcConfig),
    GitHub(GitHubConfig),
}

impl ThirdPartyAuthConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ThirdPartyAuthConfig::Disabled)
    }

    /// Builds the configured helper; OIDC runs provider discovery here
    pub async fn connect(self) -> anyhow::Result<Option<Arc<dyn ThirdPartyAuthHelper>>> {
        let helper: Arc<dyn ThirdPartyAuthHelper> = match self {
            ThirdPartyAuthConfig::Disabled => return Ok(None),
            ThirdPartyAuthConfig::Oidc(config) => Arc::new(
                OidcAuthHelper::connect(config)
                    .await
                    .context("error initializing OpenID Connect")?,
            ),
            ThirdPartyAuthConfig::GitHub(config) => Arc::new(GitHubAuthHelper::new(config)?),
        };
        Ok(Some(helper))
    }
}

/// Complete configuration of the security core
#[derive(Clone)]
pub struct Config {
    pub root_user_enabled: bool,
    pub root_user_password: String,
    pub root_user_session_ttl: Duration,
    pub third_party_auth: ThirdPartyAuthConfig,
    pub user_session_ttl: Duration,
    pub admin_user_ids: Vec<String>,
    pub auth_success_url: String,
    pub scheduler_token: String,
    pub observer_token: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("root_user_enabled", &self.root_user_enabled)
            .field("root_user_password", &"[REDACTED]")
            .field("root_user_session_ttl", &self.root_user_session_ttl)
            .field("third_party_auth", &self.third_party_auth)
            .field("user_session_ttl", &self.user_session_ttl)
            .field("admin_user_ids", &self.admin_user_ids)
            .field("auth_success_url", &self.auth_success_url)
            .field("scheduler_token", &"[REDACTED]")
            .field("observer_token", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{key} must be set"));
        // Secrets are hashed or sent verbatim, so surrounding whitespace is
        // part of the value.
        let secret = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let root_user_enabled = parse_bool("ROOT_USER_ENABLED", var("ROOT_USER_ENABLED"))?;
        let root_user_password = if root_user_enabled {
            secret("ROOT_USER_PASSWORD")?
        } else {
            String::new()
        };

        let third_party_auth = match var("THIRD_PARTY_AUTH_HELPER")
            .unwrap_or_else(|| "disabled".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "disabled" => ThirdPartyAuthConfig::Disabled,
            "oidc" => ThirdPartyAuthConfig::Oidc(OidcConfig {
                provider_url: required("OIDC_PROVIDER_URL")?,
                client_id: required("OIDC_CLIENT_ID")?,
                client_secret: secret("OIDC_CLIENT_SECRET")?,
                redirect_url: required("OIDC_REDIRECT_URL")?,
            }),
            "github" => ThirdPartyAuthConfig::GitHub(GitHubConfig {
                client_id: required("GITHUB_CLIENT_ID")?,
                client_secret: secret("GITHUB_CLIENT_SECRET")?,
                allowed_organizations: parse_list(var("GITHUB_ALLOWED_ORGANIZATIONS")),
                web_base_url: var("GITHUB_WEB_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_WEB_BASE_URL.to_string()),
                api_base_url: var("GITHUB_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            }),
            other => bail!(
                "THIRD_PARTY_AUTH_HELPER must be one of disabled, oidc or github, not {other:?}"
            ),
        };

        Ok(Self {
            root_user_enabled,
            root_user_password,
            root_user_session_ttl: parse_ttl(
                "ROOT_USER_SESSION_TTL",
                var("ROOT_USER_SESSION_TTL"),
                DEFAULT_ROOT_USER_SESSION_TTL_SECS,
            )?,
            third_party_auth,
            user_session_ttl: parse_ttl(
                "USER_SESSION_TTL",
                var("USER_SESSION_TTL"),
                DEFAULT_USER_SESSION_TTL_SECS,
            )?,
            admin_user_ids: parse_list(var("ADMIN_USER_IDS")),
            auth_success_url: var("AUTH_SUCCESS_URL").unwrap_or_default(),
            scheduler_token: secret("SCHEDULER_TOKEN")?,
            observer_token: secret("OBSERVER_TOKEN")?,
        })
    }

    /// Splits the configuration into the settings of each component.
    ///
    /// Consumes `self` so that secrets end up owned by the components that
    /// hash them.
    pub fn split(self) -> (TokenAuthFilterConfig, SessionServiceConfig, ThirdPartyAuthConfig) {
        let filter = TokenAuthFilterConfig {
            root_user_enabled: self.root_user_enabled,
            third_party_auth_enabled: self.third_party_auth.is_enabled(),
            scheduler_token: self.scheduler_token,
            observer_token: self.observer_token,
        };
        let session = SessionServiceConfig {
            root_user_enabled: self.root_user_enabled,
            root_user_password: self.root_user_password,
            root_user_session_ttl: self.root_user_session_ttl,
            user_session_ttl: self.user_session_ttl,
            admin_user_ids: self.admin_user_ids,
            auth_success_url: self.auth_success_url,
        };
        (filter, session, self.third_party_auth)
    }
}

fn parse_bool(key: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => bail!("{key} must be true or false, not {other:?}"),
    }
}

fn parse_ttl(key: &str, value: Option<String>, default_secs: i64) -> anyhow::Result<Duration> {
    let secs = match value {
        None => default_secs,
        Some(v) => v
            .parse::<u32>()
            .with_context(|| format!("{key} must be a number of seconds, not {v:?}"))?
            .into(),
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::seconds(secs))
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
