//! Domain model for credential records.
//!
//! # Responsibility
//! - Define the canonical credential record and its closed enumerations.
//! - Own the wire/store string tables and the fixed role sort rank.
//!
//! # Invariants
//! - Every record is identified by a random, immutable `CredentialId`.
//! - Records are never deleted; `updated_at` stays `None` until first update.

pub mod credential;
