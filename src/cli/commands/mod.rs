//! One module per `pwvault` subcommand.
//!
//! Account commands expose `execute` (open the vault, then act) and `run`
//! (act on an already-open vault), so the interactive shell can reuse them.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod delete;
pub mod get;
pub mod init;
pub mod list;
pub mod passwd;
pub mod rotate;
pub mod shell;
