//! High-level calls against a DataManager server.
//!
//! # Design
//! `DataManagerClient` owns the [`RequestConfig`] and hands out requests
//! borrowing it. Each operation builds one [`Request`], executes it, and maps
//! transport, header and decoding failures into an [`ApiError`].
//!
//! `login` and `ping` return only the decoded body, so an Error status from
//! the server is an [`ApiError`] too. `register` hands back the response and
//! leaves the status to the caller.

use crate::config::RequestConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, RequestError};
use crate::request::{Payload, Request};
use crate::response::RestRequestResponse;
use crate::types::{CredentialsRequest, LoginResponse, PingRequest, StringResponse};

#[derive(Debug, Clone)]
pub struct DataManagerClient {
    config: RequestConfig,
}

impl DataManagerClient {
    pub fn new(config: RequestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Store the token returned by [`login`](Self::login) for later calls.
    pub fn set_session_token(&mut self, token: impl Into<String>) {
        self.config.session_token = token.into();
    }

    /// A default request bound to this client's config.
    pub fn request<'a>(&'a self, endpoint: impl Into<Endpoint>, payload: impl Into<Payload<'a>>) -> Request<'a> {
        Request::new(endpoint, payload, &self.config)
    }

    /// Log in and return the session token.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let credentials = CredentialsRequest {
            machine_id: self.config.machine_id.clone(),
            username: username.to_string(),
            password: password.to_string(),
        };
        let mut response = LoginResponse::default();
        let outcome = self
            .request(Endpoint::LOGIN, Payload::json(&credentials))
            .execute(Some(&mut response));
        check(outcome)?;
        Ok(response)
    }

    /// Create a new account.
    ///
    /// A rejected registration (for example a taken username) is still
    /// `Ok`: check [`RestRequestResponse::is_error`] and `message`.
    pub fn register(&self, username: &str, password: &str) -> Result<RestRequestResponse, ApiError> {
        let credentials = CredentialsRequest {
            machine_id: String::new(),
            username: username.to_string(),
            password: password.to_string(),
        };
        self.request(Endpoint::REGISTER, Payload::json(&credentials))
            .send()
            .map_err(ApiError::from)
    }

    /// Check that the server is reachable. Authenticated when a session
    /// token is configured.
    pub fn ping(&self) -> Result<StringResponse, ApiError> {
        let payload = PingRequest {
            payload: "ping".to_string(),
        };
        let mut request = self.request(Endpoint::PING, Payload::json(&payload));
        if !self.config.session_token.is_empty() {
            request = request.with_auth_from_config();
        }

        let mut response = StringResponse::default();
        check(request.execute(Some(&mut response)))?;
        Ok(response)
    }
}

/// Treat an Error status as a failed call.
fn check(outcome: Result<RestRequestResponse, RequestError>) -> Result<RestRequestResponse, ApiError> {
    match outcome {
        Ok(response) if response.is_error() => Err(ApiError::new(Some(response), None)),
        Ok(response) => Ok(response),
        Err(err) => Err(ApiError::from(err)),
    }
}
