//! Check whether a credential record exists.

use super::get_credentials::GetCredentialsRequest;
use super::{run_use_case, Operation, ServiceResult, UseCase};
use crate::repo::credential_repo::CredentialRepository;
use serde::{Deserialize, Serialize};

/// Same selector contract as get.
pub type ExistsCredentialsRequest = GetCredentialsRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsCredentialsResponse {
    pub exists: bool,
}

pub struct ExistsCredentials<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> ExistsCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: CredentialRepository> UseCase for ExistsCredentials<R> {
    type Request = ExistsCredentialsRequest;
    type Response = ExistsCredentialsResponse;

    fn operation(&self) -> Operation {
        Operation::Exists
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                request.to_selector()
            },
            |selector| {
                self.repo
                    .credential_exists(&selector)
                    .map(|exists| ExistsCredentialsResponse { exists })
            },
        )
    }
}
