//! Turns a configured [`Request`] into one HTTP exchange over ureq.
//!
//! # Design
//! Execution is split in two steps. `prepare` does everything that can fail
//! without touching the network (URL join, payload encoding, header
//! resolution). `dispatch` performs the blocking call. The timing signal is
//! sent between the two, so a request that never reached the network never
//! fires it.
//!
//! A fresh agent is built for every call with HTTP error codes passed through
//! as responses: the status-header protocol, not the HTTP code, decides
//! success.

use std::io::Read;
use std::sync::mpsc::SyncSender;
use std::time::Instant;

use tracing::debug;
use ureq::tls::TlsConfig;
use ureq::{Agent, Body, BodyReader, SendBody};
use url::Url;

use crate::auth::Authorization;
use crate::config::RequestConfig;
use crate::endpoint::build_url;
use crate::error::RequestError;
use crate::http::Response;
use crate::request::{BodyEncoding, ContentType, Method, Payload, PayloadKind, Request};

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";

/// Request body after encoding.
pub(crate) enum OutboundBody<'a> {
    Bytes(Vec<u8>),
    Stream(Box<dyn Read + Send + 'a>),
}

/// A request with everything resolved except the network call itself.
pub(crate) struct Prepared<'a> {
    agent: Agent,
    insecure: bool,
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: OutboundBody<'a>,
}

/// Resolve URL, body and headers. Returns the timing sender separately so the
/// caller can fire it once the call returns.
pub(crate) fn prepare(request: Request<'_>) -> Result<(Option<SyncSender<Instant>>, Prepared<'_>), RequestError> {
    let Request {
        endpoint,
        payload,
        config,
        method,
        encoding,
        content_type,
        authorization,
        headers,
        timing,
    } = request;

    let url = build_url(&config.url, &endpoint)?;
    let body = encode_body(payload, encoding)?;
    let headers = resolve_headers(&content_type, headers.as_deref().unwrap_or_default(), authorization.as_ref());

    let prepared = Prepared {
        agent: build_agent(config),
        insecure: config.ignore_cert,
        method,
        url,
        headers,
        body,
    };
    Ok((timing, prepared))
}

impl Prepared<'_> {
    /// Issue the blocking HTTP call.
    pub(crate) fn dispatch(self) -> Result<Response<BodyReader<'static>>, RequestError> {
        debug!(
            method = %self.method,
            url = %self.url,
            insecure = self.insecure,
            "dispatching request"
        );

        let url = self.url.as_str();
        let mut builder = match self.method {
            Method::Get => self.agent.get(url).force_send_body(),
            Method::Delete => self.agent.delete(url).force_send_body(),
            Method::Post => self.agent.post(url),
            Method::Put => self.agent.put(url),
        };
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match self.body {
            OutboundBody::Bytes(data) => builder.send(&data[..])?,
            OutboundBody::Stream(mut reader) => builder.send(SendBody::from_reader(&mut reader))?,
        };
        Ok(response.map(Body::into_reader))
    }
}

fn build_agent(config: &RequestConfig) -> Agent {
    let tls = TlsConfig::builder()
        .disable_verification(config.ignore_cert)
        .build();
    Agent::config_builder()
        .http_status_as_error(false)
        .tls_config(tls)
        .build()
        .new_agent()
}

/// Encode the payload according to the request's body encoding.
///
/// A raw request whose payload is neither bytes nor a stream is sent with an
/// empty body rather than failing.
pub(crate) fn encode_body(payload: Payload<'_>, encoding: BodyEncoding) -> Result<OutboundBody<'_>, RequestError> {
    let kind = payload.kind_name();
    match (encoding, payload.0) {
        (BodyEncoding::Json, PayloadKind::Empty) => Ok(OutboundBody::Bytes(b"null".to_vec())),
        (BodyEncoding::Json, PayloadKind::Json(data)) => {
            data.map(OutboundBody::Bytes).map_err(RequestError::Serialization)
        }
        (BodyEncoding::Json, PayloadKind::Bytes(_) | PayloadKind::Stream(_)) => {
            Err(RequestError::UnencodablePayload { payload: kind, encoding })
        }
        (BodyEncoding::Raw, PayloadKind::Bytes(data)) => Ok(OutboundBody::Bytes(data)),
        (BodyEncoding::Raw, PayloadKind::Stream(reader)) => Ok(OutboundBody::Stream(reader)),
        (BodyEncoding::Raw, PayloadKind::Empty) => Ok(OutboundBody::Bytes(Vec::new())),
        (BodyEncoding::Raw, PayloadKind::Json(_)) => {
            debug!("raw request with a structured payload, sending empty body");
            Ok(OutboundBody::Bytes(Vec::new()))
        }
    }
}

/// Final header list: content type, then extra headers, then authorization.
///
/// Names are matched case-insensitively, so a later header replaces an
/// earlier one of the same name.
pub(crate) fn resolve_headers(
    content_type: &ContentType,
    extra: &[(String, String)],
    authorization: Option<&Authorization>,
) -> Vec<(String, String)> {
    let mut resolved = vec![(CONTENT_TYPE.to_string(), content_type.as_str().to_string())];
    for (name, value) in extra {
        set_header(&mut resolved, name, value.clone());
    }
    if let Some(authorization) = authorization {
        set_header(&mut resolved, AUTHORIZATION, authorization.header_value());
    }
    resolved
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(existing) => *existing = (name.to_string(), value),
        None => headers.push((name.to_string(), value)),
    }
}
