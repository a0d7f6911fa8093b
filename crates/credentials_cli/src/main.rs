//! Command-line probe for the credentials boundary.
//!
//! Usage: `credentials_cli <create|get|exists|list|search|update> [json]`
//!
//! Prints the response envelope as JSON on stdout; exits non-zero unless the
//! call succeeded.

use credentials_api::{open_and_dispatch, ApiConfig, Method};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(method) = args.next() else {
        eprintln!("{}", usage());
        return ExitCode::from(2);
    };
    if method == "version" {
        println!("credentials_cli version={}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    let payload = args.next().unwrap_or_default();

    let config = ApiConfig::from_env();
    if let Err(err) = config.init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let response = open_and_dispatch(&config, &method, &payload);
    println!("{}", response.to_json());
    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn usage() -> String {
    let methods = Method::ALL
        .iter()
        .map(|method| method.as_str())
        .collect::<Vec<_>>()
        .join("|");
    format!("usage: credentials_cli <{methods}|version> [json-payload]")
}
