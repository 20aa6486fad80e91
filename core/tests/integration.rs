//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives real requests through
//! the ureq transport. Covers the account operations, every status-header
//! outcome, body encodings, header resolution and the timing signal.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use datamanager_core::{
    ApiError, Authorization, BodyEncoding, DataManagerClient, Endpoint, Method, Payload, Request, RequestConfig,
    RequestError, ResponseStatus,
};
use serde::{Deserialize, Serialize};

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Inspection {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Inspection {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default, PartialEq, Deserialize)]
struct Token {
    token: String,
}

fn inspect(request: Request<'_>) -> Inspection {
    let mut seen = Inspection {
        method: String::new(),
        path: String::new(),
        headers: Vec::new(),
        body: String::new(),
    };
    let response = request.execute(Some(&mut seen)).unwrap();
    assert!(response.is_success());
    seen
}

// ---------------------------------------------------------------------------
// Account operations
// ---------------------------------------------------------------------------

#[test]
fn account_lifecycle() {
    let mut client = DataManagerClient::new(RequestConfig {
        machine_id: "machine-1".to_string(),
        ..RequestConfig::new(start_server())
    });

    // Step 1: unauthenticated ping.
    let pong = client.ping().unwrap();
    assert_eq!(pong.string, "pong");

    // Step 2: login before registering fails with the server's message.
    let err = client.login("alice", "secret").unwrap_err();
    assert_eq!(err.message(), Some("bad credentials"));
    assert_eq!(err.http_code(), Some(200));
    assert!(matches!(err.cause, Some(RequestError::ResponseError)));
    assert_eq!(err.to_string(), "HTTPCode: 200; Message: bad credentials");

    // Step 3: register.
    let resp = client.register("alice", "secret").unwrap();
    assert_eq!(resp.status, Some(ResponseStatus::Success));

    // Step 4: register again is an Error status on HTTP 409, returned as a
    // response rather than an error.
    let resp = client.register("alice", "secret").unwrap();
    assert!(resp.is_error());
    assert_eq!(resp.http_code, 409);
    assert_eq!(resp.message, "user already exists");

    // Step 5: login returns a token.
    let login = client.login("alice", "secret").unwrap();
    assert!(!login.token.is_empty());
    client.set_session_token(login.token);

    // Step 6: authenticated ping.
    let pong = client.ping().unwrap();
    assert_eq!(pong.string, "pong");

    // Step 7: a stale token is rejected.
    client.set_session_token("stale");
    let err = client.ping().unwrap_err();
    assert_eq!(err.message(), Some("invalid session token"));
    assert_eq!(err.http_code(), Some(401));
}

#[test]
fn login_against_closed_port_is_transport_error() {
    let client = DataManagerClient::new(RequestConfig::new(closed_port()));
    let err: ApiError = client.login("alice", "secret").unwrap_err();
    assert!(err.response.is_none());
    assert!(matches!(err.cause, Some(RequestError::Transport(_))));
}

// ---------------------------------------------------------------------------
// Status-header protocol
// ---------------------------------------------------------------------------

#[test]
fn missing_status_header_is_header_error_with_partial_response() {
    let config = RequestConfig::new(start_server());
    let mut dest = Token::default();
    let err = Request::new("/status/missing", (), &config)
        .with_method(Method::Get)
        .execute(Some(&mut dest))
        .unwrap_err();

    let partial = err.partial_response().expect("partial response");
    assert_eq!(partial.http_code, 200);
    assert!(partial.status.is_none());
    assert!(partial.headers.contains_key("x-response-message"));
    assert_eq!(dest, Token::default());
}

#[test]
fn invalid_status_values_are_header_errors() {
    let config = RequestConfig::new(start_server());
    for value in ["2", "-1", "abc"] {
        let err = Request::new(format!("/status/{value}"), (), &config)
            .with_method(Method::Get)
            .send()
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeaders { .. }), "{value}");
    }
}

#[test]
fn error_status_skips_decoding() {
    let config = RequestConfig::new(start_server());
    let mut dest = Token::default();
    let resp = Request::new("/status/1", (), &config)
        .execute(Some(&mut dest))
        .unwrap();
    assert!(resp.is_error());
    assert_eq!(resp.message, "status 1");
    assert_eq!(dest, Token::default());
}

#[test]
fn success_status_decodes_only_with_destination() {
    let config = RequestConfig::new(start_server());

    let mut dest = Token::default();
    let resp = Request::new("/status/0", (), &config).execute(Some(&mut dest)).unwrap();
    assert!(resp.is_success());
    assert_eq!(dest.token, "raw");

    let resp = Request::new("/status/0", (), &config).send().unwrap();
    assert!(resp.is_success());
}

#[test]
fn http_error_code_with_success_status_is_success() {
    let config = RequestConfig::new(start_server());
    let mut dest = Token::default();
    let resp = Request::new("/http/500", (), &config).execute(Some(&mut dest)).unwrap();
    assert_eq!(resp.http_code, 500);
    assert!(resp.is_success());
    assert_eq!(dest.token, "500");
}

#[test]
fn undecodable_body_is_decode_error() {
    let config = RequestConfig::new(start_server());
    let mut dest = Token::default();
    let err = Request::new("/bad-json", (), &config).execute(Some(&mut dest)).unwrap_err();
    assert!(matches!(err, RequestError::Decode(_)));

    // Without a destination the same body is drained and ignored.
    assert!(Request::new("/bad-json", (), &config).send().is_ok());
}

// ---------------------------------------------------------------------------
// Body encodings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    id: u64,
    name: String,
    tags: Vec<String>,
    public: bool,
}

#[test]
fn json_payload_round_trips_through_echo() {
    let config = RequestConfig::new(start_server());
    let sent = Document {
        id: 42,
        name: "report.pdf".to_string(),
        tags: vec!["work".to_string(), "q3".to_string()],
        public: false,
    };
    let mut received: Option<Document> = None;
    Request::new("/echo", Payload::json(&sent), &config)
        .with_method(Method::Put)
        .execute(Some(&mut received))
        .unwrap();
    assert_eq!(received, Some(sent));
}

#[test]
fn raw_bytes_are_sent_verbatim() {
    let config = RequestConfig::new(start_server());
    let seen = inspect(
        Request::new("/inspect", Payload::bytes(b"\x00binary\xff".to_vec()), &config)
            .with_encoding(BodyEncoding::Raw)
            .with_content_type("application/octet-stream"),
    );
    assert_eq!(seen.body, String::from_utf8_lossy(b"\x00binary\xff"));
    assert_eq!(seen.header("content-type"), Some("application/octet-stream"));
}

#[test]
fn raw_stream_is_sent() {
    let config = RequestConfig::new(start_server());
    let data = "streamed file contents".repeat(1000);
    let seen = inspect(
        Request::new("/inspect", Payload::stream(std::io::Cursor::new(data.clone().into_bytes())), &config)
            .with_encoding(BodyEncoding::Raw),
    );
    assert_eq!(seen.body, data);
}

#[test]
fn raw_encoding_with_structured_payload_sends_empty_body() {
    let config = RequestConfig::new(start_server());
    let seen = inspect(
        Request::new("/inspect", serde_json::json!({"ignored": true}), &config).with_encoding(BodyEncoding::Raw),
    );
    assert_eq!(seen.body, "");
}

#[test]
fn get_and_delete_carry_json_body() {
    let config = RequestConfig::new(start_server());
    for method in [Method::Get, Method::Delete] {
        let seen = inspect(Request::new("/inspect", serde_json::json!({"fid": 7}), &config).with_method(method));
        assert_eq!(seen.method, method.as_str());
        assert_eq!(serde_json::from_str::<serde_json::Value>(&seen.body).unwrap(), serde_json::json!({"fid": 7}));
    }
}

// ---------------------------------------------------------------------------
// Headers and URL
// ---------------------------------------------------------------------------

#[test]
fn headers_reach_the_server_in_resolved_form() {
    let config = RequestConfig {
        session_token: "session-xyz".to_string(),
        ..RequestConfig::new(start_server())
    };
    let seen = inspect(
        Request::new("/inspect", (), &config)
            .with_header("X-Machine-Id", "m-7")
            .with_header("Content-Type", "application/x-custom")
            .with_header("Authorization", "Basic ignored")
            .with_auth_from_config(),
    );
    assert_eq!(seen.header("x-machine-id"), Some("m-7"));
    assert_eq!(seen.header("content-type"), Some("application/x-custom"));
    assert_eq!(seen.header("authorization"), Some("Bearer session-xyz"));
    assert_eq!(seen.headers.iter().filter(|(k, _)| k == "authorization").count(), 1);
}

#[test]
fn explicit_auth_is_sent() {
    let config = RequestConfig::new(start_server());
    let seen = inspect(Request::new("/inspect", (), &config).with_auth(Authorization::bearer("explicit")));
    assert_eq!(seen.header("authorization"), Some("Bearer explicit"));
}

#[test]
fn endpoint_is_joined_onto_base_path() {
    let config = RequestConfig::new(format!("{}/", start_server()));
    let seen = inspect(Request::new(Endpoint::from("//inspect"), (), &config));
    assert_eq!(seen.path, "/inspect");
}

// ---------------------------------------------------------------------------
// Timing signal
// ---------------------------------------------------------------------------

#[test]
fn timing_signal_fires_once_per_call() {
    let config = RequestConfig::new(start_server());
    let (tx, rx) = mpsc::sync_channel(0);

    let observer = thread::spawn(move || rx.iter().collect::<Vec<Instant>>());

    let before = Instant::now();
    Request::new("/status/0", (), &config)
        .with_timing_signal(tx.clone())
        .send()
        .unwrap();
    Request::new("/status/1", (), &config)
        .with_timing_signal(tx.clone())
        .send()
        .unwrap();
    Request::new("/status/missing", (), &config)
        .with_timing_signal(tx)
        .send()
        .unwrap_err();

    let stamps = observer.join().unwrap();
    assert_eq!(stamps.len(), 3);
    assert!(stamps.iter().all(|t| *t >= before));
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn timing_signal_fires_on_transport_failure() {
    let config = RequestConfig::new(closed_port());
    let (tx, rx) = mpsc::sync_channel(1);
    let err = Request::new(Endpoint::PING, (), &config)
        .with_timing_signal(tx)
        .send()
        .unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)));
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[test]
fn timing_signal_does_not_fire_when_call_never_starts() {
    let config = RequestConfig::new(start_server());
    let (tx, rx) = mpsc::sync_channel(1);
    let err = Request::new("/echo", Payload::bytes(vec![1, 2, 3]), &config)
        .with_timing_signal(tx)
        .send()
        .unwrap_err();
    assert!(matches!(err, RequestError::UnencodablePayload { .. }));
    assert!(rx.try_recv().is_err());
}

#[test]
fn dropped_observer_does_not_fail_the_call() {
    let config = RequestConfig::new(start_server());
    let (tx, rx) = mpsc::sync_channel(0);
    drop(rx);
    let resp = Request::new("/status/0", (), &config).with_timing_signal(tx).send().unwrap();
    assert!(resp.is_success());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn requests_run_in_parallel_sharing_config() {
    let config = RequestConfig::new(start_server());
    thread::scope(|s| {
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let config = &config;
                s.spawn(move || {
                    let mut back: Option<u64> = None;
                    Request::new("/echo", Payload::json(&i), config)
                        .execute(Some(&mut back))
                        .unwrap();
                    back
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(i as u64));
        }
    });
}
