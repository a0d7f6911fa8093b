//! Filtered, sorted, paginated id search.
//!
//! # Invariants
//! - Only ids are returned; callers page through records with list.
//! - Adjacent pages of the same query never overlap or skip ids.

use super::{run_use_case, Operation, ServiceResult, UseCase};
use crate::model::credential::{CredentialId, Role, SortDirection, SortKey};
use crate::repo::credential_repo::{CredentialRepository, CredentialSearchQuery};
use crate::validation::rules::{
    check_email_filter, check_limit, check_offset, check_role_filter, check_sort_direction,
    check_sort_key,
};
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCredentialsRequest {
    /// Required, 1..=128.
    #[serde(deserialize_with = "super::null_as_default")]
    pub limit: i64,
    #[serde(deserialize_with = "super::null_as_default")]
    pub offset: i64,
    /// `none`, `email`, `role`, `created_at` or `updated_at`; empty means `none`.
    #[serde(deserialize_with = "super::null_as_default")]
    pub sort: String,
    /// `asc` or `desc`; empty means ascending.
    #[serde(deserialize_with = "super::null_as_default")]
    pub sort_direction: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub emails: Vec<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub roles: Vec<String>,
}

impl SearchCredentialsRequest {
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_limit(&mut errors, self.limit);
        check_offset(&mut errors, self.offset);
        check_sort_key(&mut errors, &self.sort);
        check_sort_direction(&mut errors, &self.sort_direction);
        check_email_filter(&mut errors, "emails", &self.emails);
        check_role_filter(&mut errors, "roles", &self.roles);
        errors.into_result()
    }

    fn to_query(&self) -> CredentialSearchQuery {
        CredentialSearchQuery {
            limit: u32::try_from(self.limit).unwrap_or_default(),
            offset: u32::try_from(self.offset).unwrap_or(u32::MAX),
            sort: SortKey::parse(&self.sort).unwrap_or_default(),
            direction: SortDirection::parse(&self.sort_direction),
            emails: self.emails.clone(),
            roles: self
                .roles
                .iter()
                .filter_map(|role| Role::parse(role).ok())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCredentialsResponse {
    pub ids: Vec<CredentialId>,
}

pub struct SearchCredentials<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> SearchCredentials<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: CredentialRepository> UseCase for SearchCredentials<R> {
    type Request = SearchCredentialsRequest;
    type Response = SearchCredentialsResponse;

    fn operation(&self) -> Operation {
        Operation::Search
    }

    fn exec(&self, request: &Self::Request) -> ServiceResult<Self::Response> {
        run_use_case(
            self.operation(),
            || {
                request.validate()?;
                Ok(request.to_query())
            },
            |query| {
                self.repo
                    .search_credentials(&query)
                    .map(|ids| SearchCredentialsResponse { ids })
            },
        )
    }
}
