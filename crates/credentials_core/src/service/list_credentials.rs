//! Bulk lookup by id.
//!
//! Missing ids are omitted from the response; result order is unspecified.

use super::{parse_id, run_use_case, Operation, ServiceResult, UseCase};
use crate::model::credential::{Credential, CredentialId};
use crate::repo::credential_repo::CredentialRepository;
use crate::validation::rules::check_id_list;
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListCredentialsRequest {
    #[serde(deserialize_with = "super::null_as_default")]
    pub ids: Vec<String>,
}

impl ListCredentialsRequest {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_id_list(&mut errors, "ids", &self.ids);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCredentialsResponse {
    pub credentials: Vec<Credential>,
}

pub struct ListCredentials<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> ListCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: CredentialRepository> UseCase for ListCredentials<R> {
    type Request = ListCredentialsRequest;
    type Response = ListCredentialsResponse;

    fn operation(&self) -> Operation {
        Operation::List
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                request
                    .ids
                    .iter()
                    .enumerate()
                    .map(|(index, id)| parse_id(&format!("ids[{index}]"), id))
                    .collect::<Result<Vec<CredentialId>, _>>()
            },
            |ids| {
                self.repo
                    .list_credentials(&ids)
                    .map(|credentials| ListCredentialsResponse { credentials })
            },
        )
    }
}
