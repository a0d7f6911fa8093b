//! Caller boundary for the credentials core.
//!
//! # Responsibility
//! - Decode JSON requests, run the matching use case, encode the result.
//! - Map `ErrorKind` to stable status codes.
//! - Resolve store and logging settings from the environment.

pub mod api;
pub mod config;

pub use api::{dispatch, open_and_dispatch, ApiResponse, Method, StatusCode};
pub use config::ApiConfig;
