//! Store-backed principals: users and service accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A human user, created on first successful third-party login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier handed back by the identity provider (case sensitive)
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
    /// Set while the user is locked out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created: Utc::now(),
            locked: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }
}

/// A non-human principal that authenticates with a long-lived token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub id: String,
    pub description: String,
    pub created: DateTime<Utc>,
    /// `hash("", token)`; never leaves the process
    #[serde(skip)]
    pub hashed_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<DateTime<Utc>>,
}

impl ServiceAccount {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            created: Utc::now(),
            hashed_token: String::new(),
            locked: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do NOT include the hashed token here; it ends up in log output.
        f.debug_struct("ServiceAccount")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("created", &self.created)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
