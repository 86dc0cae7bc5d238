//! Integration tests for account operations on a real vault file.

use std::path::PathBuf;

use pwvault::accounts::{AccountService, AccountSummary, PasswordSpec};
use pwvault::crypto::KdfParams;
use pwvault::errors::PwVaultError;
use pwvault::vault::VaultHandle;
use tempfile::TempDir;

fn fast_kdf() -> KdfParams {
    KdfParams::Pbkdf2Sha256 {
        iterations: 100_000,
    }
}

/// Helper: an encrypted vault `v.db` with passphrase "hello".
fn setup() -> (TempDir, PathBuf, VaultHandle) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("v.db");
    let vault = VaultHandle::create_new(&path, Some("hello"), true, Some(&fast_kdf())).unwrap();
    (dir, path, vault)
}

fn is_lowercase_password(pw: &str, len: usize) -> bool {
    pw.chars().count() == len && pw.chars().all(|c| c.is_ascii_lowercase())
}

#[test]
fn create_then_fetch_generated_password() {
    let (_dir, path, vault) = setup();
    assert!(path.exists());
    assert!(vault.load().unwrap().is_empty());

    let service = AccountService::new(&vault);
    service
        .create("Gmail", "a@b.com", &PasswordSpec::default())
        .unwrap();

    let creds = service.fetch("Gmail").unwrap();
    assert_eq!(creds.username, "a@b.com");
    assert!(is_lowercase_password(&creds.password, 8), "{}", creds.password.as_str());

    let err = service
        .create("Gmail", "other", &PasswordSpec::default())
        .err()
        .unwrap();
    assert!(matches!(err, PwVaultError::AccountAlreadyExists(_)), "{err}");
}

#[test]
fn rotate_replaces_only_the_password() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);
    service
        .create("Gmail", "a@b.com", &PasswordSpec::default())
        .unwrap();

    service
        .rotate("Gmail", &PasswordSpec::literal("newpass1"))
        .unwrap();
    let creds = service.fetch("Gmail").unwrap();
    assert_eq!(creds.username, "a@b.com");
    assert_eq!(creds.password.as_str(), "newpass1");

    let err = service
        .rotate("Gmail", &PasswordSpec::literal(""))
        .err()
        .unwrap();
    assert!(matches!(err, PwVaultError::Validation(_)), "{err}");
    assert_eq!(service.fetch("Gmail").unwrap().password.as_str(), "newpass1");

    let err = service
        .rotate("Gmail", &PasswordSpec::literal("has space"))
        .err()
        .unwrap();
    assert!(matches!(err, PwVaultError::Validation(_)), "{err}");
    assert_eq!(service.fetch("Gmail").unwrap().password.as_str(), "newpass1");
}

#[test]
fn delete_twice_is_not_found() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);
    service
        .create("Gmail", "a@b.com", &PasswordSpec::default())
        .unwrap();

    service.delete("Gmail").unwrap();
    assert!(matches!(
        service.fetch("Gmail").err().unwrap(),
        PwVaultError::AccountNotFound(_)
    ));
    assert!(matches!(
        service.delete("Gmail").err().unwrap(),
        PwVaultError::AccountNotFound(_)
    ));
}

#[test]
fn absent_organization_cannot_be_rotated() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);
    let err = service
        .rotate("Nowhere", &PasswordSpec::literal("x"))
        .err()
        .unwrap();
    assert!(matches!(err, PwVaultError::AccountNotFound(_)), "{err}");
}

#[test]
fn wrong_passphrase_is_authentication_not_format() {
    let (_dir, path, _vault) = setup();
    let err = VaultHandle::open(&path, Some("wrong"), true).err().unwrap();
    assert!(matches!(err, PwVaultError::AuthenticationFailed), "{err}");
}

#[test]
fn invalid_identifiers_are_rejected_before_touching_the_vault() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);

    for (org, user) in [("", "u"), ("has space", "u"), ("Org", ""), ("Org", "a b")] {
        let err = service
            .create(org, user, &PasswordSpec::default())
            .err()
            .unwrap();
        assert!(matches!(err, PwVaultError::Validation(_)), "{org:?}/{user:?}: {err}");
    }
    assert!(vault.load().unwrap().is_empty());
}

#[test]
fn custom_generation_parameters_are_honoured() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);
    service
        .create("Bank", "me", &PasswordSpec::random(24, "01"))
        .unwrap();

    let pw = service.fetch("Bank").unwrap().password;
    assert_eq!(pw.len(), 24);
    assert!(pw.chars().all(|c| c == '0' || c == '1'));

    let err = service
        .create("Shop", "me", &PasswordSpec::random(0, "abc"))
        .err()
        .unwrap();
    assert!(matches!(err, PwVaultError::Validation(_)), "{err}");
}

#[test]
fn list_keeps_insertion_order_and_hides_passwords() {
    let (_dir, _path, vault) = setup();
    let service = AccountService::new(&vault);
    service.create("Zeta", "z", &PasswordSpec::default()).unwrap();
    service.create("Alpha", "a", &PasswordSpec::default()).unwrap();

    assert_eq!(
        service.list().unwrap(),
        vec![
            AccountSummary {
                organization: "Zeta".into(),
                username: "z".into()
            },
            AccountSummary {
                organization: "Alpha".into(),
                username: "a".into()
            },
        ]
    );
}

#[test]
fn operations_see_changes_from_other_handles() {
    let (_dir, path, vault) = setup();
    let other = VaultHandle::open(&path, Some("hello"), true).unwrap();

    AccountService::new(&other)
        .create("Gmail", "a@b.com", &PasswordSpec::default())
        .unwrap();

    // No caching: the first handle reads the file fresh.
    assert!(AccountService::new(&vault).contains("Gmail").unwrap());
}
