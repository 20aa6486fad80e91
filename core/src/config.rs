//! Connection and identity parameters shared by every request of a client.

use serde::{Deserialize, Serialize};

use crate::auth::Authorization;

/// Long-lived settings for talking to one DataManager server.
///
/// Built once by the embedding application and only ever borrowed by
/// [`Request`](crate::Request); nothing in this crate mutates it while a call
/// is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Base URL of the server, e.g. `https://dm.example.com/api`.
    pub url: String,
    /// Skip TLS certificate verification. Opt-in only.
    #[serde(default)]
    pub ignore_cert: bool,
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub session_token: String,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Bearer credential built from the stored session token.
    pub fn bearer_auth(&self) -> Authorization {
        Authorization::bearer(self.session_token.clone())
    }
}
