//! Credentials system of record.
//! This crate owns the credential invariants: validation, persistence and
//! the six use cases built on them.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::credential::{
    Credential, CredentialFields, CredentialId, Role, RoleParseError, SortDirection, SortKey,
};
pub use repo::credential_repo::{
    CredentialRepository, CredentialSearchQuery, CredentialSelector, RepoError, RepoResult,
    SqliteCredentialRepository,
};
pub use service::create_credentials::{CreateCredentials, CreateCredentialsRequest};
pub use service::exists_credentials::{
    ExistsCredentials, ExistsCredentialsRequest, ExistsCredentialsResponse,
};
pub use service::get_credentials::{GetCredentials, GetCredentialsRequest};
pub use service::list_credentials::{
    ListCredentials, ListCredentialsRequest, ListCredentialsResponse,
};
pub use service::search_credentials::{
    SearchCredentials, SearchCredentialsRequest, SearchCredentialsResponse,
};
pub use service::update_credentials::{UpdateCredentials, UpdateCredentialsRequest};
pub use service::{
    system_clock, Clock, InvalidRequest, Operation, ServiceError, ServiceResult, UseCase,
};
pub use validation::{FieldViolation, ValidationErrors, Violation};

