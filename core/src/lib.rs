//! Client-side protocol layer for the DataManager file service.
//!
//! # Overview
//! A [`Request`] describes one call (endpoint, payload, method, encoding,
//! auth, extra headers). Executing it performs one blocking HTTP exchange and
//! classifies the response through the status-header protocol: the
//! `X-Response-Status` and `X-Response-Message` headers decide success, not
//! the HTTP status code.
//!
//! # Design
//! - `transport` turns a request into a ureq call; `response` classifies the
//!   result and optionally decodes a JSON body.
//! - `RequestError` covers a single execution; `ApiError` is the uniform
//!   failure returned by [`DataManagerClient`] operations.
//! - No retries, no timeouts, no shared mutable state: requests are consumed
//!   by execution and only borrow the long-lived [`RequestConfig`].
//! - DTOs in `types` are carried, never interpreted.

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

mod transport;

pub use ureq::http;

pub use auth::{AuthScheme, Authorization};
pub use client::DataManagerClient;
pub use config::RequestConfig;
pub use endpoint::Endpoint;
pub use error::{ApiError, RequestError};
pub use request::{BodyEncoding, ContentType, Method, Payload, Request};
pub use response::{decode_response, ResponseStatus, RestRequestResponse, HEADER_STATUS, HEADER_STATUS_MESSAGE};
pub use types::{CredentialsRequest, LoginResponse, PingRequest, StringResponse};
