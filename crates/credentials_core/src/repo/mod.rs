//! Repository layer: one persistence operation per use case.
//!
//! # Responsibility
//! - Define the credential data-access contract.
//! - Keep SQL and SQLite error shapes inside the persistence boundary.
//!
//! # Invariants
//! - Store failures are classified exactly once, here, into `ErrorKind`.
//! - Uniqueness violations and zero-row results are domain errors; everything
//!   else is reported as an internal failure.

pub mod credential_repo;
