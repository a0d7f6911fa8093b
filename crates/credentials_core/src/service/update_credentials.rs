//! Replace every mutable field of one credential record.
//!
//! # Invariants
//! - Replace semantics: a token field absent from the request is cleared.
//! - `updated_at` is taken from the service clock; `created_at` is untouched.

use super::{parse_id, run_use_case, system_clock, Clock, Operation, ServiceResult, UseCase};
use crate::model::credential::{non_empty, Credential, CredentialFields, Role};
use crate::repo::credential_repo::CredentialRepository;
use crate::validation::rules::{check_role, check_token_id, require_email, require_id};
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCredentialsRequest {
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub email: String,
    /// Empty means `none`.
    #[serde(deserialize_with = "super::null_as_default")]
    pub role: String,
    pub email_validation_token_id: Option<String>,
    pub pending_email_validation_token_id: Option<String>,
    pub password_token_id: Option<String>,
    pub reset_password_token_id: Option<String>,
}

impl UpdateCredentialsRequest {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_id(&mut errors, "id", &self.id);
        require_email(&mut errors, "email", &self.email);
        check_role(&mut errors, "role", &self.role);
        check_token_id(
            &mut errors,
            "email_validation_token_id",
            self.email_validation_token_id.as_deref(),
        );
        check_token_id(
            &mut errors,
            "pending_email_validation_token_id",
            self.pending_email_validation_token_id.as_deref(),
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
            pending_email_validation_token_id: non_empty(
                self.pending_email_validation_token_id.clone(),
            ),
            password_token_id: non_empty(self.password_token_id.clone()),
            reset_password_token_id: non_empty(self.reset_password_token_id.clone()),
        }
    }
}

pub struct UpdateCredentials<R: CredentialRepository> {
    repo: R,
    clock: Clock,
}

impl<R: CredentialRepository> UpdateCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, system_clock)
    }

    pub fn with_clock(repo: R, clock: Clock) -> Self {
        Self { repo, clock }
    }
}

impl<R: CredentialRepository> UseCase for UpdateCredentials<R> {
    type Request = UpdateCredentialsRequest;
    type Response = Credential;

    fn operation(&self) -> Operation {
        Operation::Update
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                Ok((parse_id("id", &request.id)?, request.to_fields()))
            },
            |(id, fields)| self.repo.update_credential(id, (self.clock)(), &fields),
        )
    }
}
