//! Sessions and the values handed to clients when one is created

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Server-side record correlating a bearer token with an identity
///
/// A session is usable as a credential only once `authenticated` is set and
/// while `expires` (if any) lies in the future.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Owning user; `None` for root sessions and for pending sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub root: bool,
    /// `hash("", state)`; correlates the federation callback exactly once
    #[serde(skip)]
    pub hashed_oauth2_state: String,
    /// `hash("", token)`; the bearer credential
    #[serde(skip)]
    pub hashed_token: String,
    /// Where to send the user once federation completes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_success_url: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    /// A session that still has to complete third-party authentication
    pub fn pending(
        hashed_oauth2_state: String,
        hashed_token: String,
        auth_success_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            root: false,
            hashed_oauth2_state,
            hashed_token,
            auth_success_url,
            created: Utc::now(),
            authenticated: None,
            expires: None,
        }
    }

    /// An already-authenticated root session
    pub fn root(hashed_token: String, now: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            root: true,
            hashed_oauth2_state: String::new(),
            hashed_token,
            auth_success_url: String::new(),
            created: now,
            authenticated: Some(now),
            expires: Some(expires),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |expires| now > expires)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do NOT include hashed secrets in this output.
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("root", &self.root)
            .field("authenticated", &self.authenticated)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

/// A clear-text bearer token, shown to its owner exactly once
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "Token")]
pub struct Token {
    pub value: String,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token { .. }")
    }
}

/// Returned when a user session is created: where to send the user's
/// browser, and the token that becomes usable once they come back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "ThirdPartyAuthDetails", rename_all = "camelCase")]
pub struct ThirdPartyAuthDetails {
    #[serde(rename = "authURL")]
    pub auth_url: String,
    pub token: String,
}

/// Identity returned by a third-party provider after a code exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyIdentity {
    pub id: String,
    pub name: String,
}

/// Options for creating a user session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionOptions {
    /// Overrides the configured post-login redirect
    #[serde(default)]
    pub success_url: Option<String>,
}
