//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext, so the returned token is self-contained.
//!
//! Layout of a token:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! Optional associated data (`aad`) is authenticated but not encrypted;
//! the vault binds its plaintext header this way.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{PwVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under a 32-byte `key`.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Decrypt a token produced by `encrypt`.
pub fn decrypt(key: &[u8], token: &[u8]) -> Result<Vec<u8>> {
    decrypt_with_aad(key, token, &[])
}

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt_with_aad(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| PwVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| PwVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt a token, verifying both the ciphertext and `aad`.
///
/// Every failure mode (short token, wrong key, flipped bit, different
/// `aad`) is reported as `AuthenticationFailed`.
pub fn decrypt_with_aad(key: &[u8], token: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if token.len() < NONCE_LEN + TAG_LEN {
        return Err(PwVaultError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = token.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PwVaultError::AuthenticationFailed)?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| PwVaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aad_roundtrip() {
        let key = [0x42u8; 32];
        let token = encrypt_with_aad(&key, b"records", b"header").unwrap();
        assert_eq!(token.len(), NONCE_LEN + b"records".len() + TAG_LEN);
        assert_eq!(decrypt_with_aad(&key, &token, b"header").unwrap(), b"records");
    }

    #[test]
    fn different_aad_fails_authentication() {
        let key = [0x42u8; 32];
        let token = encrypt_with_aad(&key, b"records", b"header").unwrap();
        let err = decrypt_with_aad(&key, &token, b"HEADER").unwrap_err();
        assert!(matches!(err, PwVaultError::AuthenticationFailed));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [0x01u8; 32];
        let token = encrypt(&key, b"").unwrap();
        assert!(decrypt(&key, &token).unwrap().is_empty());
    }

    #[test]
    fn bad_key_length_is_an_encryption_error() {
        let err = encrypt(&[0u8; 16], b"x").unwrap_err();
        assert!(matches!(err, PwVaultError::EncryptionFailed(_)));
    }
}
