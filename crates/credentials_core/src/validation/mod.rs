//! Request-shape validation.
//!
//! # Responsibility
//! - Reject structurally invalid input before any id parsing or store access.
//! - Report every violated rule, not only the first one.
//!
//! # Invariants
//! - Validation is pure: no I/O, no clock, no randomness.
//! - Empty optional strings count as absent.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rules;

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Required,
    /// Field is required when the named sibling is absent.
    RequiredWithout(&'static str),
    InvalidEmail,
    TooLong { max: usize },
    WrongLength { expected: usize },
    TooFew { min: usize },
    TooMany { max: usize },
    OutOfRange { min: i64, max: Option<i64> },
    UnknownRole(String),
    UnknownSortKey(String),
    UnknownSortDirection(String),
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::RequiredWithout(other) => write!(f, "is required when `{other}` is absent"),
            Self::InvalidEmail => write!(f, "is not a valid email"),
            Self::TooLong { max } => write!(f, "exceeds {max} characters"),
            Self::WrongLength { expected } => write!(f, "must be exactly {expected} characters"),
            Self::TooFew { min } => write!(f, "needs at least {min} entries"),
            Self::TooMany { max } => write!(f, "allows at most {max} entries"),
            Self::OutOfRange { min, max: Some(max) } => {
                write!(f, "must be between {min} and {max}")
            }
            Self::OutOfRange { min, max: None } => write!(f, "must be at least {min}"),
            Self::UnknownRole(value) => write!(f, "unknown role `{value}`"),
            Self::UnknownSortKey(value) => write!(f, "unknown sort key `{value}`"),
            Self::UnknownSortDirection(value) => write!(f, "unknown sort direction `{value}`"),
        }
    }
}

/// Violation bound to a field path such as `email` or `ids[3]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub violation: Violation,
}

/// Non-empty set of violations produced by one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, violation: Violation) {
        self.violations.push(FieldViolation {
            field: field.into(),
            violation,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|item| item.field == field)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, item) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", item.field, item.violation)?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}
