//! Description of one outbound call and its single execution entry point.
//!
//! # Design
//! `Request` is configured through by-value `with_*` transformations and is
//! consumed by [`Request::execute`], so a configured request can never be
//! shared between two in-flight calls. Nothing is validated while building:
//! URL, payload and header problems surface when the request is executed.

use std::fmt;
use std::io::Read;
use std::sync::mpsc::SyncSender;
use std::time::Instant;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::trace;

use crate::auth::Authorization;
use crate::config::RequestConfig;
use crate::endpoint::Endpoint;
use crate::error::RequestError;
use crate::response::{decode_response, RestRequestResponse};
use crate::transport;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the payload is turned into the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// Serialize the payload as JSON.
    Json,
    /// Send a byte buffer or stream as-is.
    Raw,
}

/// Value of the `Content-Type` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType(String);

impl ContentType {
    pub const JSON: &'static str = "application/json";

    pub fn new(value: impl Into<String>) -> Self {
        ContentType(value.into())
    }

    pub fn json() -> Self {
        ContentType::new(Self::JSON)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::json()
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        ContentType::new(value)
    }
}

/// The data carried by a request.
///
/// Which variant is present is decided when the payload is built; whether it
/// fits the request's [`BodyEncoding`] is only checked at execution.
pub struct Payload<'a>(pub(crate) PayloadKind<'a>);

pub(crate) enum PayloadKind<'a> {
    Empty,
    Json(serde_json::Result<Vec<u8>>),
    Bytes(Vec<u8>),
    Stream(Box<dyn Read + Send + 'a>),
}

impl<'a> Payload<'a> {
    pub fn empty() -> Self {
        Payload(PayloadKind::Empty)
    }

    /// Capture a structured value as JSON bytes. A value that does not
    /// serialize is kept as an error and reported when the request executes.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        Payload(PayloadKind::Json(serde_json::to_vec(value)))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Payload(PayloadKind::Bytes(data.into()))
    }

    pub fn stream(reader: impl Read + Send + 'a) -> Self {
        Payload(PayloadKind::Stream(Box::new(reader)))
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self.0 {
            PayloadKind::Empty => "empty",
            PayloadKind::Json(_) => "json",
            PayloadKind::Bytes(_) => "bytes",
            PayloadKind::Stream(_) => "stream",
        }
    }
}

impl From<serde_json::Value> for Payload<'_> {
    fn from(value: serde_json::Value) -> Self {
        Payload::json(&value)
    }
}

impl From<Vec<u8>> for Payload<'_> {
    fn from(data: Vec<u8>) -> Self {
        Payload::bytes(data)
    }
}

impl From<()> for Payload<'_> {
    fn from(_: ()) -> Self {
        Payload::empty()
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            PayloadKind::Empty => f.write_str("Empty"),
            PayloadKind::Json(Ok(data)) => f.debug_tuple("Json").field(&String::from_utf8_lossy(data)).finish(),
            PayloadKind::Json(Err(e)) => f.debug_tuple("Json").field(&format_args!("<error: {e}>")).finish(),
            PayloadKind::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            PayloadKind::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One outbound call to the DataManager server.
#[derive(Debug)]
pub struct Request<'a> {
    pub(crate) endpoint: Endpoint,
    pub(crate) payload: Payload<'a>,
    pub(crate) config: &'a RequestConfig,
    pub(crate) method: Method,
    pub(crate) encoding: BodyEncoding,
    pub(crate) content_type: ContentType,
    pub(crate) authorization: Option<Authorization>,
    pub(crate) headers: Option<Vec<(String, String)>>,
    pub(crate) timing: Option<SyncSender<Instant>>,
}

impl<'a> Request<'a> {
    /// A JSON-encoded POST without authorization or extra headers.
    pub fn new(endpoint: impl Into<Endpoint>, payload: impl Into<Payload<'a>>, config: &'a RequestConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            payload: payload.into(),
            config,
            method: Method::Post,
            encoding: BodyEncoding::Json,
            content_type: ContentType::json(),
            authorization: None,
            headers: None,
            timing: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_auth(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Attach the bearer session token from the request's config.
    pub fn with_auth_from_config(mut self) -> Self {
        self.authorization = Some(self.config.bearer_auth());
        self
    }

    /// Receive the instant the transport call returns.
    ///
    /// The send happens on the calling thread and blocks until the receiver
    /// takes the value (or has buffer room).
    pub fn with_timing_signal(mut self, sender: SyncSender<Instant>) -> Self {
        self.timing = Some(sender);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Add an extra header. Setting the same name again replaces the value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        let headers = self.headers.get_or_insert_with(Vec::new);
        match headers.iter_mut().find(|(k, _)| *k == name) {
            Some(existing) => existing.1 = value,
            None => headers.push((name, value)),
        }
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref()
    }

    /// Extra headers in insertion order; empty until one is added.
    pub fn headers(&self) -> &[(String, String)] {
        self.headers.as_deref().unwrap_or_default()
    }

    pub fn config(&self) -> &RequestConfig {
        self.config
    }

    /// Execute the request and, on a success status, decode the body into
    /// `dest`.
    pub fn execute<T: DeserializeOwned>(self, dest: Option<&mut T>) -> Result<RestRequestResponse, RequestError> {
        let (timing, prepared) = transport::prepare(self)?;
        let result = prepared.dispatch();

        if let Some(sender) = timing {
            if sender.send(Instant::now()).is_err() {
                trace!("timing signal receiver dropped");
            }
        }

        decode_response(result?, dest)
    }

    /// Execute the request without decoding the response body.
    pub fn send(self) -> Result<RestRequestResponse, RequestError> {
        self.execute::<IgnoredAny>(None)
    }
}
