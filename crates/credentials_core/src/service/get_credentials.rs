//! Fetch one credential record by id and/or email.

use super::{parse_id, run_use_case, InvalidRequest, Operation, ServiceResult, UseCase};
use crate::model::credential::Credential;
use crate::repo::credential_repo::{CredentialRepository, CredentialSelector};
use crate::validation::rules::check_selector;
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

/// Point-lookup request shared by get and exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCredentialsRequest {
    #[serde(deserialize_with = "super::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub email: String,
}

impl GetCredentialsRequest {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: String::new(),
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_selector(&mut errors, &self.id, &self.email);
        errors.into_result()
    }

    pub(crate) fn to_selector(&self) -> Result<CredentialSelector, InvalidRequest> {
        let id = if self.id.is_empty() {
            None
        } else {
            Some(parse_id("id", &self.id)?)
        };
        let email = Some(self.email.clone()).filter(|email| !email.is_empty());
        Ok(CredentialSelector { id, email })
    }
}

pub struct GetCredentials<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> GetCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: CredentialRepository> UseCase for GetCredentials<R> {
    type Request = GetCredentialsRequest;
    type Response = Credential;

    fn operation(&self) -> Operation {
        Operation::Get
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                request.to_selector()
            },
            |selector| self.repo.get_credential(&selector),
        )
    }
}
