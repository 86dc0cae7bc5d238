//! Passphrase-based key derivation.
//!
//! Two slow, salted KDFs are supported; the one used for a vault is
//! recorded in its header so re-opening always uses the same cost:
//!
//! - **PBKDF2-HMAC-SHA256** (default), iteration count >= 100 000.
//! - **Argon2id**, memory-hard, for users who opt in via `.pwvault.toml`.
//!
//! Both always produce a 32-byte key for AES-256-GCM.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{PwVaultError, Result};

/// Length of a freshly generated salt in bytes.
pub const SALT_LEN: usize = 16;

/// Shortest salt accepted by `derive_key_with_params`.
pub const MIN_SALT_LEN: usize = 8;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count for new vaults.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Lowest PBKDF2 iteration count we will ever run.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Highest PBKDF2 iteration count we will ever run.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Minimum safe Argon2 memory cost in KiB (8 MB).
const MIN_ARGON2_MEMORY_KIB: u32 = 8_192;

/// Maximum Argon2 memory cost in KiB (4 GiB).
pub const MAX_ARGON2_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Maximum Argon2 iteration count and degree of parallelism.
pub const MAX_ARGON2_LANES_OR_PASSES: u32 = 64;

/// KDF algorithm and cost, as stored in the vault header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum KdfParams {
    Pbkdf2Sha256 {
        iterations: u32,
    },
    Argon2id {
        /// Memory cost in KiB.
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams::Pbkdf2Sha256 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Reject parameter sets that are cheap to brute-force or too costly to run.
    ///
    /// Headers are read before anything is authenticated, so the upper
    /// bounds keep a hostile file from exhausting memory or CPU.
    pub fn validate(&self) -> Result<()> {
        match *self {
            KdfParams::Pbkdf2Sha256 { iterations } => {
                check_range(
                    "PBKDF2 iterations",
                    iterations,
                    MIN_PBKDF2_ITERATIONS,
                    MAX_PBKDF2_ITERATIONS,
                )?;
            }
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                check_range(
                    "Argon2 memory_kib",
                    memory_kib,
                    MIN_ARGON2_MEMORY_KIB,
                    MAX_ARGON2_MEMORY_KIB,
                )?;
                check_range(
                    "Argon2 iterations",
                    iterations,
                    1,
                    MAX_ARGON2_LANES_OR_PASSES,
                )?;
                check_range(
                    "Argon2 parallelism",
                    parallelism,
                    1,
                    MAX_ARGON2_LANES_OR_PASSES,
                )?;
            }
        }
        Ok(())
    }

    /// Short human-readable name, used in logs and `list` output.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            KdfParams::Pbkdf2Sha256 { .. } => "pbkdf2-sha256",
            KdfParams::Argon2id { .. } => "argon2id",
        }
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(PwVaultError::KeyDerivationFailed(format!(
            "{name} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}

/// A 32-byte symmetric key that zeroes its memory when dropped.
///
/// Never persisted; one is derived for each encrypt or decrypt call.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Derive a key with the default parameters (PBKDF2-HMAC-SHA256, 600k rounds).
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    derive_key_with_params(passphrase, salt, &KdfParams::default())
}

/// Derive a key with explicit parameters.
///
/// The same passphrase + salt + params always produce the same key.
pub fn derive_key_with_params(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<DerivedKey> {
    params.validate()?;
    if salt.len() < MIN_SALT_LEN {
        return Err(PwVaultError::KeyDerivationFailed(format!(
            "salt must be at least {MIN_SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut key = [0u8; KEY_LEN];
    match *params {
        KdfParams::Pbkdf2Sha256 { iterations } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key);
        }
        KdfParams::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        } => {
            let argon_params = Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN))
                .map_err(|e| {
                    PwVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}"))
                })?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(passphrase, salt, &mut key)
                .map_err(|e| {
                    PwVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}"))
                })?;
        }
    }

    let derived = DerivedKey::new(key);
    key.zeroize();
    Ok(derived)
}

/// Generate a cryptographically random salt for a new vault.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams::Pbkdf2Sha256 {
        iterations: MIN_PBKDF2_ITERATIONS,
    };

    #[test]
    fn same_inputs_same_key() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key_with_params(b"hello", &salt, &FAST).unwrap();
        let b = derive_key_with_params(b"hello", &salt, &FAST).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salt_different_key() {
        let a = derive_key_with_params(b"hello", &[1u8; SALT_LEN], &FAST).unwrap();
        let b = derive_key_with_params(b"hello", &[2u8; SALT_LEN], &FAST).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn pbkdf2_below_minimum_is_rejected() {
        let weak = KdfParams::Pbkdf2Sha256 { iterations: 1_000 };
        let err = derive_key_with_params(b"pw", &[0u8; SALT_LEN], &weak)
            .err()
            .unwrap();
        assert!(matches!(err, PwVaultError::KeyDerivationFailed(_)));
    }

    #[test]
    fn argon2_below_minimum_memory_is_rejected() {
        let weak = KdfParams::Argon2id {
            memory_kib: 1_024,
            iterations: 1,
            parallelism: 1,
        };
        assert!(weak.validate().is_err());
    }

    #[test]
    fn costs_above_the_ceiling_are_rejected() {
        let too_many = KdfParams::Pbkdf2Sha256 {
            iterations: u32::MAX,
        };
        assert!(too_many.validate().is_err());

        let too_much_memory = KdfParams::Argon2id {
            memory_kib: u32::MAX,
            iterations: 1,
            parallelism: 1,
        };
        let err = derive_key_with_params(b"pw", &[0u8; SALT_LEN], &too_much_memory)
            .err()
            .unwrap();
        assert!(matches!(err, PwVaultError::KeyDerivationFailed(_)));

        let too_many_lanes = KdfParams::Argon2id {
            memory_kib: MIN_ARGON2_MEMORY_KIB,
            iterations: 1,
            parallelism: 65,
        };
        assert!(too_many_lanes.validate().is_err());

        let at_ceiling = KdfParams::Pbkdf2Sha256 {
            iterations: MAX_PBKDF2_ITERATIONS,
        };
        assert!(at_ceiling.validate().is_ok());
    }

    #[test]
    fn argon2id_derives_32_bytes() {
        let params = KdfParams::Argon2id {
            memory_kib: MIN_ARGON2_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        };
        let key = derive_key_with_params(b"pw", &[9u8; SALT_LEN], &params).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_LEN);
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn short_salt_is_rejected() {
        assert!(derive_key_with_params(b"pw", &[0u8; 4], &FAST).is_err());
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn params_serialize_with_algorithm_tag() {
        let json = serde_json::to_string(&FAST).unwrap();
        assert_eq!(json, r#"{"algorithm":"pbkdf2-sha256","iterations":100000}"#);
        let back: KdfParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FAST);
    }
}
