//! Account operations layered on a `VaultHandle`.
//!
//! Per organization the only transitions are:
//!
//! ```text
//! Absent  --create--> Present
//! Present --rotate--> Present   (password only)
//! Present --delete--> Absent
//! ```
//!
//! Every operation starts from a fresh load; mutating ones finish with
//! a full save that fails with `Conflict` if the file changed in between.

use tracing::debug;
use zeroize::Zeroizing;

use crate::errors::{PwVaultError, Result};
use crate::vault::record::{validate_organization, validate_username};
use crate::vault::{AccountRecord, Snapshot, VaultHandle};

use super::password::PasswordSpec;

/// Username and password returned by `fetch`.
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

/// What `list` shows for each account (no password).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub organization: String,
    pub username: String,
}

/// Domain operations on the accounts stored in one vault.
pub struct AccountService<'a> {
    vault: &'a VaultHandle,
}

impl<'a> AccountService<'a> {
    pub fn new(vault: &'a VaultHandle) -> Self {
        Self { vault }
    }

    /// Add an account for a new organization.
    ///
    /// Fails with `AccountAlreadyExists` if the organization is present.
    pub fn create(&self, organization: &str, username: &str, password: &PasswordSpec) -> Result<()> {
        validate_organization(organization)?;
        validate_username(username)?;
        let password = password.resolve()?;
        let record = AccountRecord::new(organization, username, &password)?;

        let Snapshot {
            mut records,
            revision,
        } = self.vault.load_snapshot()?;
        records.insert(record)?;
        self.vault.save_checked(&records, revision)?;

        debug!(organization, total = records.len(), "created account");
        Ok(())
    }

    /// Return the username and password stored for `organization`.
    pub fn fetch(&self, organization: &str) -> Result<Credentials> {
        validate_organization(organization)?;

        let records = self.vault.load()?;
        let record = records
            .get(organization)
            .ok_or_else(|| PwVaultError::AccountNotFound(organization.to_string()))?;

        Ok(Credentials {
            username: record.username().to_string(),
            password: Zeroizing::new(record.password().to_string()),
        })
    }

    /// Replace the password of an existing account.
    ///
    /// The new password is resolved and validated before the vault is
    /// read, so an invalid one leaves the stored password untouched.
    pub fn rotate(&self, organization: &str, password: &PasswordSpec) -> Result<()> {
        validate_organization(organization)?;
        let password = password.resolve()?;

        let Snapshot {
            mut records,
            revision,
        } = self.vault.load_snapshot()?;
        records
            .get_mut(organization)
            .ok_or_else(|| PwVaultError::AccountNotFound(organization.to_string()))?
            .set_password(&password)?;
        self.vault.save_checked(&records, revision)?;

        debug!(organization, "rotated account password");
        Ok(())
    }

    /// Remove the account for `organization`.
    pub fn delete(&self, organization: &str) -> Result<()> {
        validate_organization(organization)?;

        let Snapshot {
            mut records,
            revision,
        } = self.vault.load_snapshot()?;
        records.remove(organization)?;
        self.vault.save_checked(&records, revision)?;

        debug!(organization, total = records.len(), "deleted account");
        Ok(())
    }

    /// Returns `true` if an account exists for `organization`.
    pub fn contains(&self, organization: &str) -> Result<bool> {
        validate_organization(organization)?;
        Ok(self.vault.load()?.contains(organization))
    }

    /// Organizations and usernames in stored order.
    pub fn list(&self) -> Result<Vec<AccountSummary>> {
        Ok(self
            .vault
            .load()?
            .iter()
            .map(|r| AccountSummary {
                organization: r.organization().to_string(),
                username: r.username().to_string(),
            })
            .collect())
    }
}
