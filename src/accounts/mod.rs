//! Accounts module: create, fetch, rotate and delete credentials.
//!
//! - `PasswordSpec` and the random password generator (`password`)
//! - `AccountService`, the per-organization operations (`service`)

pub mod password;
pub mod service;

pub use password::{generate_password, PasswordSpec, DEFAULT_ALPHABET, DEFAULT_LENGTH};
pub use service::{AccountService, AccountSummary, Credentials};
