//! Caller-facing error taxonomy.
//!
//! Every error surfaced by repositories and use cases reports exactly one
//! `ErrorKind`; transport layers map kinds to status codes without looking at
//! message text.

use std::fmt::{Display, Formatter};

/// Stable classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input failed validation or id parsing; the store was not contacted.
    InvalidRequest,
    /// No selector was supplied, or the selector matched no row.
    NotFound,
    /// A uniqueness constraint rejected the write.
    AlreadyExists,
    /// Any other store or infrastructure failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
