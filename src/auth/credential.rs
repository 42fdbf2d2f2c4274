//! Service-account credential.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Offline service-account key, as issued by the logging backend's identity provider.
///
/// Only the fields the token minter needs are kept; unknown fields in the
/// JSON document are ignored.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: String,
    pub project_id: String,
}

impl ServiceAccountKey {
    /// Parse the JSON document handed to the process by its environment.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

// The private key must never reach a log line.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}
