//! JSON dispatch over the six credentials use cases.
//!
//! # Invariants
//! - Status codes derive from `ErrorKind` only, never from message text.
//! - Malformed payloads and unknown methods are `invalid_argument`.
//! - Dispatch returns an envelope for every input; it does not panic on bad
//!   input.

use crate::config::ApiConfig;
use credentials_core::db::open_db;
use credentials_core::{
    CreateCredentials, ErrorKind, ExistsCredentials, GetCredentials, ListCredentials,
    SearchCredentials, SqliteCredentialRepository, UpdateCredentials, UseCase,
};
use log::warn;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Caller-facing status of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Ok,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Internal => "internal",
        }
    }
}

impl From<ErrorKind> for StatusCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidRequest => Self::InvalidArgument,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::AlreadyExists => Self::AlreadyExists,
            ErrorKind::Internal => Self::Internal,
        }
    }
}

/// Response envelope returned for every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Empty on success; error chain summary otherwise.
    pub message: String,
    /// Use-case response, present only on success.
    pub body: Option<Value>,
}

impl ApiResponse {
    fn success(body: Value) -> Self {
        Self {
            status: StatusCode::Ok,
            message: String::new(),
            body: Some(body),
        }
    }

    fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            body: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::Ok
    }

    /// Encodes the envelope as one JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            serde_json::json!({
                "status": StatusCode::Internal.as_str(),
                "message": format!("encode response: {err}"),
                "body": Value::Null,
            })
            .to_string()
        })
    }
}

/// Dispatchable operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Create,
    Get,
    Exists,
    List,
    Search,
    Update,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Create,
        Method::Get,
        Method::Exists,
        Method::List,
        Method::Search,
        Method::Update,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::Exists => "exists",
            Self::List => "list",
            Self::Search => "search",
            Self::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value))
    }
}

/// Runs `method` with a JSON `payload` against an open connection.
///
/// A blank payload is read as `{}`.
pub fn dispatch(conn: &Connection, method: &str, payload: &str) -> ApiResponse {
    let Some(method) = Method::parse(method) else {
        warn!("event=api_dispatch module=api status=rejected reason=unknown_method");
        return ApiResponse::failure(
            StatusCode::InvalidArgument,
            format!("unknown method `{}`", method.trim()),
        );
    };

    let repo = match SqliteCredentialRepository::try_new(conn) {
        Ok(repo) => repo,
        Err(err) => {
            return ApiResponse::failure(
                StatusCode::Internal,
                format!("credentials repository init failed: {err}"),
            )
        }
    };

    let payload = if payload.trim().is_empty() {
        "{}"
    } else {
        payload
    };
    match method {
        Method::Create => run(CreateCredentials::new(repo), method, payload),
        Method::Get => run(GetCredentials::new(repo), method, payload),
        Method::Exists => run(ExistsCredentials::new(repo), method, payload),
        Method::List => run(ListCredentials::new(repo), method, payload),
        Method::Search => run(SearchCredentials::new(repo), method, payload),
        Method::Update => run(UpdateCredentials::new(repo), method, payload),
    }
}

/// Opens the configured database and dispatches one call on it.
pub fn open_and_dispatch(config: &ApiConfig, method: &str, payload: &str) -> ApiResponse {
    match open_db(&config.db_path) {
        Ok(conn) => dispatch(&conn, method, payload),
        Err(err) => ApiResponse::failure(
            StatusCode::Internal,
            format!("credentials database open failed: {err}"),
        ),
    }
}

fn run<U>(use_case: U, method: Method, payload: &str) -> ApiResponse
where
    U: UseCase,
    U::Request: DeserializeOwned,
    U::Response: Serialize,
{
    let request: U::Request = match serde_json::from_str(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(
                "event=api_dispatch module=api status=rejected method={} reason=malformed_payload",
                method.as_str()
            );
            return ApiResponse::failure(
                StatusCode::InvalidArgument,
                format!("malformed {} request: {err}", use_case.operation()),
            );
        }
    };

    match use_case.exec(&request) {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(body) => ApiResponse::success(body),
            Err(err) => {
                ApiResponse::failure(StatusCode::Internal, format!("encode response: {err}"))
            }
        },
        Err(err) => ApiResponse::failure(err.kind().into(), err.to_string()),
    }
}
