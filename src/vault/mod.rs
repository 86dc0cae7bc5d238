//! Vault module: the encrypted record store.
//!
//! This module provides:
//! - `AccountRecord` and `RecordSet` data types (`record`)
//! - Record set serialization (`codec`)
//! - Binary vault file format and atomic replacement (`format`)
//! - `VaultHandle` for creating, opening, loading and saving vaults (`store`)

pub mod codec;
pub mod format;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use format::{Revision, VaultHeader};
pub use record::{AccountRecord, RecordSet};
pub use store::{Snapshot, VaultHandle};
