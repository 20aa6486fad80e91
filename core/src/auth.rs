//! Credentials attached to outgoing requests.

use std::fmt;

/// Authorization scheme sent in front of the credential payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheme + payload pair, rendered as the `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub scheme: AuthScheme,
    pub payload: String,
}

impl Authorization {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            scheme: AuthScheme::Bearer,
            payload: token.into(),
        }
    }

    /// Value of the `Authorization` header: `<scheme> <payload>`.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.payload)
    }
}
