//! Events, as far as principal resolution is concerned
//!
//! Every event handed to a worker carries a worker token. The token is stored
//! hashed, and presenting it identifies the caller as the worker for that
//! event.

use serde::{Deserialize, Serialize};

/// The slice of an event the security core consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub project_id: String,
}
