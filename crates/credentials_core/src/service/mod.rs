//! Use-case layer: validate, convert, call the repository once, classify.
//!
//! # Responsibility
//! - Expose one executable unit per credentials operation.
//! - Reject invalid requests before any repository call.
//! - Attach the operation label to every failure.
//!
//! # Invariants
//! - A rejected request never reaches the repository.
//! - Every failure carries an `ErrorKind` and the operation that produced it.
//! - Each execution emits exactly one `event=<operation>` log line.

pub mod create_credentials;
pub mod exists_credentials;
pub mod get_credentials;
pub mod list_credentials;
pub mod search_credentials;
pub mod update_credentials;

use crate::error::ErrorKind;
use crate::model::credential::CredentialId;
use crate::repo::credential_repo::{RepoError, RepoResult};
use crate::validation::ValidationErrors;
use log::{error, info};
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Source of "now" in Unix epoch milliseconds.
pub type Clock = fn() -> i64;

/// Wall clock used unless a test injects its own.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// The six credentials operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Exists,
    List,
    Search,
    Update,
}

impl Operation {
    /// Stable log event name.
    pub fn event(self) -> &'static str {
        match self {
            Self::Create => "credentials_create",
            Self::Get => "credentials_get",
            Self::Exists => "credentials_exists",
            Self::List => "credentials_list",
            Self::Search => "credentials_search",
            Self::Update => "credentials_update",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create credentials",
            Self::Get => "get credentials",
            Self::Exists => "check credentials existence",
            Self::List => "list credentials",
            Self::Search => "search credentials",
            Self::Update => "update credentials",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a request was rejected before reaching the repository.
#[derive(Debug)]
pub enum InvalidRequest {
    Validation(ValidationErrors),
    /// Passed shape validation but is not a parseable uuid.
    MalformedId {
        field: String,
        value: String,
        source: uuid::Error,
    },
}

impl Display for InvalidRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::MalformedId { field, value, .. } => {
                write!(f, "{field} is not a valid uuid: `{value}`")
            }
        }
    }
}

impl Error for InvalidRequest {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::MalformedId { source, .. } => Some(source),
        }
    }
}

impl From<ValidationErrors> for InvalidRequest {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Classified failure of one operation.
#[derive(Debug)]
pub enum ServiceError {
    InvalidRequest {
        operation: Operation,
        source: InvalidRequest,
    },
    Repo {
        operation: Operation,
        source: RepoError,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Repo { source, .. } => source.kind(),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::InvalidRequest { operation, .. } | Self::Repo { operation, .. } => *operation,
        }
    }

    /// Field-level violations, when the request failed validation.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::InvalidRequest {
                source: InvalidRequest::Validation(errors),
                ..
            } => Some(errors),
            _ => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest { operation, source } => {
                write!(f, "{}: {operation}: {source}", self.kind())
            }
            Self::Repo { operation, source } => {
                write!(f, "{}: {operation}: {source}", self.kind())
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRequest { source, .. } => Some(source),
            Self::Repo { source, .. } => Some(source),
        }
    }
}

/// One executable credentials operation.
pub trait UseCase {
    type Request;
    type Response;

    fn operation(&self) -> Operation;
    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response>;
}

/// Runs one use case: `prepare` validates and converts the request, `execute`
/// performs the single repository call. Failures are wrapped with `operation`
/// and each run logs one line.
pub(crate) fn run_use_case<P, T>(
    operation: Operation,
    prepare: impl FnOnce() -> Result<P, InvalidRequest>,
    execute: impl FnOnce(P) -> RepoResult<T>,
) -> ServiceResult<T> {
    let started_at = Instant::now();

    let prepared = match prepare() {
        Ok(prepared) => prepared,
        Err(source) => {
            info!(
                "event={} module=service status=rejected error_kind={} duration_ms={}",
                operation.event(),
                ErrorKind::InvalidRequest,
                started_at.elapsed().as_millis()
            );
            return Err(ServiceError::InvalidRequest { operation, source });
        }
    };

    match execute(prepared) {
        Ok(response) => {
            info!(
                "event={} module=service status=ok duration_ms={}",
                operation.event(),
                started_at.elapsed().as_millis()
            );
            Ok(response)
        }
        Err(source) => {
            let kind = source.kind();
            if kind == ErrorKind::Internal {
                error!(
                    "event={} module=service status=error error_kind={} duration_ms={} error={}",
                    operation.event(),
                    kind,
                    started_at.elapsed().as_millis(),
                    crate::logging::single_line(&source.to_string(), 200)
                );
            } else {
                info!(
                    "event={} module=service status=error error_kind={} duration_ms={}",
                    operation.event(),
                    kind,
                    started_at.elapsed().as_millis()
                );
            }
            Err(ServiceError::Repo { operation, source })
        }
    }
}

/// Reads a JSON `null` as the field's default, like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parses an id that already passed shape validation.
pub(crate) fn parse_id(field: &str, value: &str) -> Result<CredentialId, InvalidRequest> {
    Uuid::parse_str(value).map_err(|source| InvalidRequest::MalformedId {
        field: field.to_string(),
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::create_credentials::CreateCredentialsRequest;
    use super::search_credentials::SearchCredentialsRequest;
    use super::{parse_id, system_clock, InvalidRequest, Operation, ServiceError};
    use crate::error::ErrorKind;
    use crate::repo::credential_repo::RepoError;

    #[test]
    fn malformed_id_keeps_field_and_value() {
        let err = parse_id("id", "zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz")
            .expect_err("non-hex uuid must be rejected");
        assert!(matches!(
            &err,
            InvalidRequest::MalformedId { field, .. } if field == "id"
        ));
        assert!(err.to_string().starts_with("id is not a valid uuid"));
    }

    #[test]
    fn service_error_reports_kind_and_operation() {
        let err = ServiceError::Repo {
            operation: Operation::Get,
            source: RepoError::NotFound,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.operation(), Operation::Get);
        assert_eq!(
            err.to_string(),
            "not_found: get credentials: credentials not found"
        );
    }

    #[test]
    fn null_request_fields_read_as_absent() {
        let search: SearchCredentialsRequest = serde_json::from_str(
            r#"{"limit":5,"offset":null,"sort":null,"sort_direction":null,"emails":null,"roles":null}"#,
        )
        .unwrap();
        assert_eq!(search, SearchCredentialsRequest::new(5));

        let create: CreateCredentialsRequest =
            serde_json::from_str(r#"{"email":"a@x.com","role":null,"password_token_id":null}"#)
                .unwrap();
        assert_eq!(create, CreateCredentialsRequest::new("a@x.com"));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(system_clock() > 1_577_836_800_000);
    }
}
