//! Error types for the DataManager client.
//!
//! # Design
//! `RequestError` is what a single [`Request`](crate::Request) execution can
//! fail with, one variant per failure class: transport, header validation,
//! body decoding. `ApiError` is the uniform value handed to callers of
//! [`DataManagerClient`](crate::DataManagerClient): it carries whichever of
//! the parsed response and the underlying cause are available, so an
//! application-level failure reported by the server and a dead socket look
//! the same to the caller.

use std::fmt;

use crate::request::BodyEncoding;
use crate::response::{ResponseStatus, RestRequestResponse};

/// Failures of one request execution.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The base URL parsed but cannot carry a path (e.g. `mailto:`).
    #[error("base url {0:?} cannot carry an endpoint path")]
    UnsupportedBaseUrl(String),

    /// The structured payload could not be serialized to JSON.
    #[error("failed to serialize request payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A byte or stream payload was given to a JSON-encoded request.
    #[error("{payload} payload cannot be sent with {encoding:?} encoding")]
    UnencodablePayload {
        payload: &'static str,
        encoding: BodyEncoding,
    },

    /// Connection, TLS, DNS or protocol failure; no response was received.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The status headers were missing or malformed. The partially built
    /// response (HTTP code and headers, no status) is attached.
    #[error("Invalid response headers")]
    InvalidHeaders { response: Box<RestRequestResponse> },

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(#[source] std::io::Error),

    /// The body of a successful response did not decode into the destination.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The server reported an Error status and no more specific cause exists.
    #[error("Response returned an error")]
    ResponseError,
}

impl RequestError {
    /// The partial response attached to a header-validation failure.
    pub fn partial_response(&self) -> Option<&RestRequestResponse> {
        match self {
            RequestError::InvalidHeaders { response } => Some(response),
            _ => None,
        }
    }
}

/// A failed call, with the best-available response and cause.
#[derive(Debug)]
pub struct ApiError {
    pub response: Option<RestRequestResponse>,
    pub cause: Option<RequestError>,
}

impl ApiError {
    /// Combine a response and an explicit cause.
    ///
    /// A response whose status is Error gets the generic
    /// [`RequestError::ResponseError`] cause unless a cause was supplied.
    pub fn new(response: Option<RestRequestResponse>, cause: Option<RequestError>) -> Self {
        let cause = match (&response, cause) {
            (Some(r), None) if r.status == Some(ResponseStatus::Error) => {
                Some(RequestError::ResponseError)
            }
            (_, cause) => cause,
        };
        Self { response, cause }
    }

    /// Message reported by the server, if a response was received.
    pub fn message(&self) -> Option<&str> {
        self.response.as_ref().map(|r| r.message.as_str())
    }

    /// HTTP status code of the response, if one was received.
    pub fn http_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.http_code)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        let response = err.partial_response().cloned();
        ApiError::new(response, Some(err))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(response) = &self.response {
            return write!(f, "HTTPCode: {}; Message: {}", response.http_code, response.message);
        }
        if let Some(cause) = &self.cause {
            return write!(f, "{cause}");
        }
        f.write_str("Unexpected error")
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}
