//! Cryptographic primitives for pwvault.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption (`encryption`)
//! - PBKDF2 / Argon2id passphrase-based key derivation (`kdf`)

pub mod encryption;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, DerivedKey, KdfParams};
