//! Create one credential record.
//!
//! # Invariants
//! - The id is a fresh random v4 uuid and `created_at` is taken from the
//!   service clock; neither comes from the caller.
//! - `pending_email_validation_token_id` cannot be set at creation.

use super::{run_use_case, system_clock, Clock, Operation, ServiceResult, UseCase};
use crate::model::credential::{non_empty, Credential, CredentialFields, Role};
use crate::repo::credential_repo::CredentialRepository;
use crate::validation::rules::{check_role, check_token_id, require_email};
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCredentialsRequest {
    #[serde(deserialize_with = "super::null_as_default")]
    pub email: String,
    /// Empty means `none`.
    #[serde(deserialize_with = "super::null_as_default")]
    pub role: String,
    pub email_validation_token_id: Option<String>,
    pub password_token_id: Option<String>,
    pub reset_password_token_id: Option<String>,
}

impl CreateCredentialsRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_email(&mut errors, "email", &self.email);
        check_role(&mut errors, "role", &self.role);
        check_token_id(
            &mut errors,
            "email_validation_token_id",
            self.email_validation_token_id.as_deref(),
        );
        check_token_id(
            &mut errors,
            "password_token_id",
            self.password_token_id.as_deref(),
        );
        check_token_id(
            &mut errors,
            "reset_password_token_id",
            self.reset_password_token_id.as_deref(),
        );
        errors.into_result()
    }

    fn to_fields(&self) -> CredentialFields {
        CredentialFields {
            email: self.email.clone(),
            role: Role::parse(&self.role).unwrap_or_default(),
            email_validation_token_id: non_empty(self.email_validation_token_id.clone()),
            pending_email_validation_token_id: None,
            password_token_id: non_empty(self.password_token_id.clone()),
            reset_password_token_id: non_empty(self.reset_password_token_id.clone()),
        }
    }
}

pub struct CreateCredentials<R: CredentialRepository> {
    repo: R,
    clock: Clock,
}

impl<R: CredentialRepository> CreateCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, system_clock)
    }

    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }
}

impl<R: CredentialRepository> UseCase for CreateCredentials<R> {
    type Request = CreateCredentialsRequest;
    type Response = Credential;

    fn operation(&self) -> Operation {
        Operation::Create
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                Ok(request.to_fields())
            },
            |fields| {
                self.repo
                    .create_credential(Uuid::new_v4(), (self.clock)(), &fields)
            },
        )
    }
}
