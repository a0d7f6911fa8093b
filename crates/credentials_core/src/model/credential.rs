//! Credential record, role and sort enumerations.
//!
//! # Invariants
//! - `Role::None` is the zero value; `"none"` and `""` both parse to it.
//! - Role rank order is `none < early-access-program < admin < core`.
//! - Token id fields use `None` for absent; empty strings are never stored.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of one credential record.
pub type CredentialId = Uuid;

/// Access role attached to a credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Zero value: no elevated access.
    #[default]
    None,
    EarlyAccessProgram,
    Admin,
    Core,
}

impl Role {
    /// Every role, in sort-rank order.
    pub const ALL: [Role; 4] = [
        Role::None,
        Role::EarlyAccessProgram,
        Role::Admin,
        Role::Core,
    ];

    /// Wire and store representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::EarlyAccessProgram => "early-access-program",
            Self::Admin => "admin",
            Self::Core => "core",
        }
    }

    /// Fixed position used by "sort by role".
    pub fn sort_rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::EarlyAccessProgram => 1,
            Self::Admin => 2,
            Self::Core => 3,
        }
    }

    /// Parses the wire/store representation.
    ///
    /// The empty string is accepted as the zero role.
    pub fn parse(value: &str) -> Result<Self, RoleParseError> {
        if value.is_empty() {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| RoleParseError::UnknownRole(value.to_string()))
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Role conversion failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    /// Text did not match any role.
    UnknownRole(String),
    /// Store value was neither text nor null.
    UnsupportedType(Type),
}

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRole(value) => write!(f, "unknown value for credentials role: `{value}`"),
            Self::UnsupportedType(kind) => {
                write!(f, "unsupported type for credentials role: {kind}")
            }
        }
    }
}

impl Error for RoleParseError {}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::None),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                let text =
                    std::str::from_utf8(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))?;
                Self::parse(text).map_err(|err| FromSqlError::Other(Box::new(err)))
            }
            other => Err(FromSqlError::Other(Box::new(
                RoleParseError::UnsupportedType(other.data_type()),
            ))),
        }
    }
}

/// Column used to order search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Default ordering (ascending email).
    #[default]
    None,
    Email,
    Role,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Email => "email",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Parses the wire representation; `""` and `"none"` mean default order.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "none" => Some(Self::None),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

/// Direction applied to a non-default sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses `asc`/`desc` case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

/// Mutable field set written by create and fully replaced by update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFields {
    pub email: String,
    pub role: Role,
    pub email_validation_token_id: Option<String>,
    pub pending_email_validation_token_id: Option<String>,
    pub password_token_id: Option<String>,
    pub reset_password_token_id: Option<String>,
}

impl CredentialFields {
    /// Fields with only an email set; role `none`, no tokens.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

/// Canonical credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    /// Unique across all records.
    pub email: String,
    pub role: Role,
    pub email_validation_token_id: Option<String>,
    pub pending_email_validation_token_id: Option<String>,
    pub password_token_id: Option<String>,
    pub reset_password_token_id: Option<String>,
    /// Unix epoch milliseconds, written once at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds of the latest update.
    pub updated_at: Option<i64>,
}

/// Maps empty strings to `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
