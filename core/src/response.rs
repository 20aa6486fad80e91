//! Classification of server responses via the status-header protocol.
//!
//! # Design
//! Every DataManager response carries two headers on top of the HTTP status:
//! `X-Response-Status` (`0` success, `1` error) and `X-Response-Message`.
//! The HTTP code is recorded but never consulted: a 200 with status `1` is an
//! application error, and a 500 with status `0` is a success.
//!
//! The decoder works on any `http::Response<impl Read>`, so responses from
//! another transport (or a test fixture) go through the same checks.

use std::io::{self, Read};

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::RequestError;
use crate::http::{HeaderMap, Response};

/// Numeric application status header.
pub const HEADER_STATUS: &str = "X-Response-Status";
/// Free-text application message header.
pub const HEADER_STATUS_MESSAGE: &str = "X-Response-Message";

/// Application-level outcome reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    /// Parse the numeric header value. Only `0` and `1` are valid, with no
    /// surrounding whitespace.
    pub fn from_header(value: &str) -> Option<Self> {
        match value.parse::<i64>().ok()? {
            0 => Some(ResponseStatus::Success),
            1 => Some(ResponseStatus::Error),
            _ => None,
        }
    }
}

/// One completed exchange, as seen through the status-header protocol.
#[derive(Debug, Clone)]
pub struct RestRequestResponse {
    pub http_code: u16,
    /// `None` only on the partial response attached to
    /// [`RequestError::InvalidHeaders`].
    pub status: Option<ResponseStatus>,
    pub message: String,
    pub headers: HeaderMap,
}

impl RestRequestResponse {
    pub fn is_success(&self) -> bool {
        self.status == Some(ResponseStatus::Success)
    }

    pub fn is_error(&self) -> bool {
        self.status == Some(ResponseStatus::Error)
    }
}

/// Classify `response` and, on success, decode its JSON body into `dest`.
///
/// `dest` is only written when decoding succeeds. The body is read to the end
/// before returning on every path so the connection can be reused.
pub fn decode_response<R, T>(
    response: Response<R>,
    dest: Option<&mut T>,
) -> Result<RestRequestResponse, RequestError>
where
    R: Read,
    T: DeserializeOwned,
{
    let (parts, mut body) = response.into_parts();
    let mut decoded = RestRequestResponse {
        http_code: parts.status.as_u16(),
        status: None,
        message: String::new(),
        headers: parts.headers,
    };

    let Some(status) = read_status(&decoded.headers) else {
        trace!(http_code = decoded.http_code, "missing or malformed status header");
        drain(&mut body);
        return Err(RequestError::InvalidHeaders {
            response: Box::new(decoded),
        });
    };
    decoded.status = Some(status);
    decoded.message = decoded
        .headers
        .get(HEADER_STATUS_MESSAGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    match (status, dest) {
        (ResponseStatus::Success, Some(dest)) => {
            let mut buf = Vec::new();
            let read = body.read_to_end(&mut buf);
            drain(&mut body);
            read.map_err(RequestError::Body)?;
            *dest = serde_json::from_slice(&buf).map_err(RequestError::Decode)?;
            trace!(bytes = buf.len(), "decoded response body");
        }
        (status, _) => {
            trace!(?status, "skipping response body");
            drain(&mut body);
        }
    }

    Ok(decoded)
}

fn read_status(headers: &HeaderMap) -> Option<ResponseStatus> {
    let value = headers.get(HEADER_STATUS)?.to_str().ok()?;
    ResponseStatus::from_header(value)
}

fn drain<R: Read>(body: &mut R) {
    if let Err(e) = io::copy(body, &mut io::sink()) {
        trace!("failed to drain response body: {e}");
    }
}
