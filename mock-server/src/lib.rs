use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const HEADER_STATUS: &str = "X-Response-Status";
pub const HEADER_STATUS_MESSAGE: &str = "X-Response-Message";

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub mid: String,
    pub username: String,
    pub pass: String,
}

#[derive(Deserialize)]
pub struct Ping {
    #[serde(rename = "Payload")]
    pub payload: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StringResponse {
    #[serde(rename = "String")]
    pub string: String,
}

/// What the server saw of a request, returned by `/inspect`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Inspection {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Default)]
pub struct Store {
    /// username -> password
    users: HashMap<String, String>,
    /// session token -> username
    sessions: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/ping", post(ping))
        .route("/user/login", post(login))
        .route("/user/register", post(register))
        .route("/echo", any(echo))
        .route("/inspect", any(inspect))
        .route("/status/{value}", any(raw_status))
        .route("/http/{code}", any(http_code))
        .route("/bad-json", any(bad_json))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Respond with the status-header pair and a JSON body.
fn reply<T: Serialize>(code: StatusCode, status: u8, message: &str, body: T) -> Response {
    (
        code,
        [
            (HEADER_STATUS, status.to_string()),
            (HEADER_STATUS_MESSAGE, message.to_string()),
        ],
        Json(body),
    )
        .into_response()
}

fn success<T: Serialize>(body: T) -> Response {
    reply(StatusCode::OK, 0, "ok", body)
}

fn failure(code: StatusCode, message: &str) -> Response {
    reply(code, 1, message, serde_json::json!({}))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn ping(State(db): State<Db>, headers: HeaderMap, Json(input): Json<Ping>) -> Response {
    if input.payload != "ping" {
        return failure(StatusCode::BAD_REQUEST, "invalid ping payload");
    }
    if let Some(token) = bearer_token(&headers) {
        if !db.read().await.sessions.contains_key(token) {
            return failure(StatusCode::UNAUTHORIZED, "invalid session token");
        }
    }
    success(StringResponse {
        string: "pong".to_string(),
    })
}

// Bad credentials are reported as HTTP 200 with an error status.
async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Response {
    let mut store = db.write().await;
    if store.users.get(&input.username) != Some(&input.pass) {
        return failure(StatusCode::OK, "bad credentials");
    }
    let token = Uuid::new_v4().simple().to_string();
    store.sessions.insert(token.clone(), input.username);
    success(LoginResponse { token })
}

async fn register(State(db): State<Db>, Json(input): Json<Credentials>) -> Response {
    let mut store = db.write().await;
    if store.users.contains_key(&input.username) {
        return failure(StatusCode::CONFLICT, "user already exists");
    }
    tracing::info!(username = %input.username, machine = %input.mid, "registered user");
    store.users.insert(input.username, input.pass);
    success(serde_json::json!({}))
}

/// Send the request body back unchanged, with a success status.
async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    (
        StatusCode::OK,
        [
            (HEADER_STATUS, header::HeaderValue::from_static("0")),
            (HEADER_STATUS_MESSAGE, header::HeaderValue::from_static("ok")),
            (header::CONTENT_TYPE.as_str(), content_type),
        ],
        body,
    )
        .into_response()
}

async fn inspect(method: Method, uri: axum::http::Uri, headers: HeaderMap, body: Bytes) -> Response {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    success(Inspection {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Reply with an arbitrary status header value; `missing` omits it.
async fn raw_status(Path(value): Path<String>) -> Response {
    let body = Json(serde_json::json!({"token": "raw"}));
    if value == "missing" {
        return (StatusCode::OK, [(HEADER_STATUS_MESSAGE, "no status")], body).into_response();
    }
    (
        StatusCode::OK,
        [(HEADER_STATUS, value.clone()), (HEADER_STATUS_MESSAGE, format!("status {value}"))],
        body,
    )
        .into_response()
}

/// Success status carried on an arbitrary HTTP code.
async fn http_code(Path(code): Path<u16>) -> Response {
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::IM_A_TEAPOT);
    reply(code, 0, "ok", serde_json::json!({"token": code.as_u16().to_string()}))
}

async fn bad_json() -> Response {
    (
        StatusCode::OK,
        [(HEADER_STATUS, "0"), (HEADER_STATUS_MESSAGE, "ok")],
        "not json",
    )
        .into_response()
}
