//! Integration tests for the pwvault crypto module.

use pwvault::crypto::kdf::{KdfParams, KEY_LEN, SALT_LEN};
use pwvault::crypto::{decrypt, derive_key_with_params, encrypt, generate_salt};
use pwvault::errors::PwVaultError;

/// Cheapest parameters the KDF accepts, so the suite stays fast.
fn fast_kdf() -> KdfParams {
    KdfParams::Pbkdf2Sha256 {
        iterations: 100_000,
    }
}

#[test]
fn derived_key_roundtrips_plaintext() {
    let salt = generate_salt();
    let key = derive_key_with_params(b"hello", &salt, &fast_kdf()).unwrap();

    let messages: [&[u8]; 3] = [b"", b"short", "ünïcödé secrets".as_bytes()];
    for msg in messages {
        let token = encrypt(key.as_bytes(), msg).unwrap();
        assert_eq!(decrypt(key.as_bytes(), &token).unwrap(), msg);
    }
}

#[test]
fn key_from_other_passphrase_fails_authentication() {
    let salt = generate_salt();
    let right = derive_key_with_params(b"hello", &salt, &fast_kdf()).unwrap();
    let wrong = derive_key_with_params(b"wrong", &salt, &fast_kdf()).unwrap();

    let token = encrypt(right.as_bytes(), b"secret data").unwrap();
    assert!(matches!(
        decrypt(wrong.as_bytes(), &token),
        Err(PwVaultError::AuthenticationFailed)
    ));
}

#[test]
fn derivation_is_deterministic_and_salted() {
    let salt = [7u8; SALT_LEN];
    let a = derive_key_with_params(b"pass", &salt, &fast_kdf()).unwrap();
    let b = derive_key_with_params(b"pass", &salt, &fast_kdf()).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
    assert_eq!(a.as_bytes().len(), KEY_LEN);

    let other_salt = derive_key_with_params(b"pass", &[8u8; SALT_LEN], &fast_kdf()).unwrap();
    assert_ne!(a.as_bytes(), other_salt.as_bytes());
}

#[test]
fn every_bit_flip_is_detected() {
    let key = [42u8; KEY_LEN];
    let token = encrypt(&key, b"integrity matters").unwrap();

    for i in 0..token.len() {
        let mut tampered = token.clone();
        tampered[i] ^= 0x01;
        assert!(
            matches!(
                decrypt(&key, &tampered),
                Err(PwVaultError::AuthenticationFailed)
            ),
            "flip at byte {i} went unnoticed"
        );
    }
}

#[test]
fn encryption_is_randomized() {
    let key = [1u8; KEY_LEN];
    let a = encrypt(&key, b"same").unwrap();
    let b = encrypt(&key, b"same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn argon2id_keys_differ_from_pbkdf2_keys() {
    let salt = [3u8; SALT_LEN];
    let argon = KdfParams::Argon2id {
        memory_kib: 8192,
        iterations: 1,
        parallelism: 1,
    };
    let a = derive_key_with_params(b"pass", &salt, &argon).unwrap();
    let p = derive_key_with_params(b"pass", &salt, &fast_kdf()).unwrap();
    assert_ne!(a.as_bytes(), p.as_bytes());
}
