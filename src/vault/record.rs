//! Account records and the ordered record set stored inside a vault.
//!
//! Records are plain data: they carry no reference to the file they
//! came from. `VaultHandle` re-associates them with a file on load.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::{PwVaultError, Result};

/// One organization / username / password triple.
///
/// The organization is the record's key and is unique within a vault.
/// All three fields are wiped from memory when the record is dropped.
/// There is no public way to blank a live record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    organization: String,
    username: String,
    password: String,
}

impl AccountRecord {
    /// Build a record, validating all three fields.
    pub fn new(organization: &str, username: &str, password: &str) -> Result<Self> {
        validate_organization(organization)?;
        validate_username(username)?;
        validate_password(password)?;
        Ok(Self {
            organization: organization.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Replace the password in place. The old value is zeroized.
    pub fn set_password(&mut self, new_password: &str) -> Result<()> {
        validate_password(new_password)?;
        self.password.zeroize();
        self.password = new_password.to_string();
        Ok(())
    }

    /// Re-check every field; used when records come back from disk.
    pub fn validate(&self) -> Result<()> {
        validate_organization(&self.organization)?;
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

impl Drop for AccountRecord {
    fn drop(&mut self) {
        self.organization.zeroize();
        self.username.zeroize();
        self.password.zeroize();
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("organization", &self.organization)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The full, ordered list of records in one vault.
///
/// Order is insertion order and survives load/save, but lookups are
/// always by organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<AccountRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from decoded records, rejecting duplicate organizations.
    pub fn from_records(records: Vec<AccountRecord>) -> Result<Self> {
        let mut set = Self::new();
        for record in records {
            set.insert(record)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccountRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[AccountRecord] {
        &self.records
    }

    pub fn contains(&self, organization: &str) -> bool {
        self.get(organization).is_some()
    }

    pub fn get(&self, organization: &str) -> Option<&AccountRecord> {
        self.records
            .iter()
            .find(|r| r.organization == organization)
    }

    pub fn get_mut(&mut self, organization: &str) -> Option<&mut AccountRecord> {
        self.records
            .iter_mut()
            .find(|r| r.organization == organization)
    }

    /// Append a record. Fails if its organization is already present.
    pub fn insert(&mut self, record: AccountRecord) -> Result<()> {
        if self.contains(&record.organization) {
            return Err(PwVaultError::AccountAlreadyExists(
                record.organization.clone(),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    /// Remove the record for `organization`, keeping the others in order.
    pub fn remove(&mut self, organization: &str) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| r.organization != organization);
        if self.records.len() == before {
            return Err(PwVaultError::AccountNotFound(organization.to_string()));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a AccountRecord;
    type IntoIter = std::slice::Iter<'a, AccountRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_organization(organization: &str) -> Result<()> {
    validate_token("organization", organization)
}

pub fn validate_username(username: &str) -> Result<()> {
    validate_token("username", username)
}

pub fn validate_password(password: &str) -> Result<()> {
    validate_token("password", password)
}

/// A token is a non-empty string with no whitespace anywhere in it.
fn validate_token(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(PwVaultError::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(PwVaultError::Validation(format!(
            "{field} cannot contain whitespace"
        )));
    }
    Ok(())
}
