//! File-level vault operations: create, open, load, save.
//!
//! `VaultHandle` is a capability bound to one vault file. It holds the
//! path, the passphrase and the header read at open time, but never the
//! records: every `load` re-reads and decrypts the whole file, and every
//! `save` re-encrypts and atomically replaces it, so the file on disk is
//! always exactly what the last successful save wrote.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::encryption::{decrypt_with_aad, encrypt_with_aad};
use crate::crypto::kdf::{derive_key_with_params, generate_salt, KdfParams};
use crate::errors::{PwVaultError, Result};

use super::codec;
use super::format::{self, RawVault, Revision, VaultHeader};
use super::record::RecordSet;

/// Records read from the vault together with the revision they came from.
///
/// Pass the revision back to `VaultHandle::save_checked` to detect a
/// concurrent writer between the load and the save.
#[derive(Debug)]
pub struct Snapshot {
    pub records: RecordSet,
    pub revision: Revision,
}

/// An open vault file. Create one with `VaultHandle::create_new` or
/// `VaultHandle::open`.
pub struct VaultHandle {
    /// Path to the vault file on disk.
    path: PathBuf,

    /// Passphrase bytes (zeroized on drop); `None` for unencrypted vaults.
    passphrase: Option<Zeroizing<Vec<u8>>>,

    /// Header captured at create/open time (mode, salt, KDF params).
    header: VaultHeader,
}

impl VaultHandle {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new, empty vault file at `path`.
    ///
    /// For an encrypted vault a random salt is generated and stored in
    /// the header together with `kdf` (or the default KDF params).
    /// Fails with `VaultAlreadyExists` if anything exists at `path`;
    /// the existing file is never touched.
    pub fn create_new(
        path: &Path,
        passphrase: Option<&str>,
        encrypted: bool,
        kdf: Option<&KdfParams>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(PwVaultError::VaultAlreadyExists(path.to_path_buf()));
        }

        let passphrase = resolve_passphrase(passphrase, encrypted)?;

        let header = if encrypted {
            let kdf = kdf.copied().unwrap_or_default();
            kdf.validate()?;
            VaultHeader::encrypted(generate_salt().to_vec(), kdf)
        } else {
            VaultHeader::plaintext()
        };

        let bytes = encode_file(&header, passphrase.as_deref(), &RecordSet::new())?;
        format::write_new_atomic(path, &bytes)?;

        debug!(path = %path.display(), encrypted, "created vault");

        Ok(Self {
            path: path.to_path_buf(),
            passphrase,
            header,
        })
    }

    /// Open an existing vault file.
    ///
    /// The whole file is read and decoded once, so a wrong passphrase
    /// (`AuthenticationFailed`), a mode mismatch or a corrupt record set
    /// (`InvalidVaultFormat`) is reported here rather than on first use.
    pub fn open(path: &Path, passphrase: Option<&str>, encrypted: bool) -> Result<Self> {
        let raw = format::read_vault(path)?;
        check_mode(&raw.header, encrypted)?;

        let passphrase = resolve_passphrase(passphrase, encrypted)?;
        let records = decode_payload(&raw, passphrase.as_deref())?;

        debug!(
            path = %path.display(),
            encrypted,
            records = records.len(),
            revision = %raw.revision,
            "opened vault"
        );

        Ok(Self {
            path: path.to_path_buf(),
            passphrase,
            header: raw.header,
        })
    }

    // ------------------------------------------------------------------
    // Load / save
    // ------------------------------------------------------------------

    /// Read, decrypt and decode the full record set.
    pub fn load(&self) -> Result<RecordSet> {
        self.load_snapshot().map(|snapshot| snapshot.records)
    }

    /// Like `load`, also returning the revision of the file that was read.
    pub fn load_snapshot(&self) -> Result<Snapshot> {
        let raw = format::read_vault(&self.path)?;
        check_mode(&raw.header, self.is_encrypted())?;
        let records = decode_payload(&raw, self.passphrase.as_deref())?;

        debug!(
            path = %self.path.display(),
            records = records.len(),
            revision = %raw.revision,
            "loaded vault"
        );

        Ok(Snapshot {
            records,
            revision: raw.revision,
        })
    }

    /// Encode, encrypt and atomically write the entire record set.
    pub fn save(&self, records: &RecordSet) -> Result<()> {
        let bytes = encode_file(&self.header, self.passphrase.as_deref(), records)?;
        format::write_atomic(&self.path, &bytes)?;

        debug!(path = %self.path.display(), records = records.len(), "saved vault");
        Ok(())
    }

    /// Save, but only if the file still has revision `expected`.
    ///
    /// Fails with `Conflict` (and writes nothing) if another writer
    /// replaced the file after the snapshot was taken.
    pub fn save_checked(&self, records: &RecordSet, expected: Revision) -> Result<()> {
        let bytes = encode_file(&self.header, self.passphrase.as_deref(), records)?;
        self.replace_if_unchanged(&bytes, expected)?;

        debug!(path = %self.path.display(), records = records.len(), "saved vault");
        Ok(())
    }

    /// Re-encrypt the whole vault under a new passphrase and a fresh salt.
    ///
    /// `kdf` optionally switches the KDF params at the same time; by
    /// default the vault keeps its current ones.
    pub fn change_passphrase(
        &mut self,
        new_passphrase: &str,
        kdf: Option<&KdfParams>,
    ) -> Result<()> {
        if !self.is_encrypted() {
            return Err(PwVaultError::Validation(
                "vault is not encrypted — there is no passphrase to change".into(),
            ));
        }
        let new_passphrase = resolve_passphrase(Some(new_passphrase), true)?;

        let snapshot = self.load_snapshot()?;

        let kdf = kdf.copied().or(self.header.kdf).unwrap_or_default();
        kdf.validate()?;
        let new_header = VaultHeader {
            created_at: self.header.created_at,
            ..VaultHeader::encrypted(generate_salt().to_vec(), kdf)
        };

        let bytes = encode_file(&new_header, new_passphrase.as_deref(), &snapshot.records)?;
        self.replace_if_unchanged(&bytes, snapshot.revision)?;

        self.passphrase = new_passphrase;
        self.header = new_header;

        debug!(
            path = %self.path.display(),
            kdf = kdf.algorithm_name(),
            records = snapshot.records.len(),
            "re-encrypted vault under new passphrase"
        );
        Ok(())
    }

    fn replace_if_unchanged(&self, bytes: &[u8], expected: Revision) -> Result<()> {
        let current = format::read_revision(&self.path)?;
        if current != expected {
            debug!(
                path = %self.path.display(),
                %expected,
                %current,
                "vault changed on disk since it was loaded"
            );
            return Err(PwVaultError::Conflict(self.path.clone()));
        }
        format::write_atomic(&self.path, bytes)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the vault payload is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.header.encrypted
    }

    /// Returns the vault creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.header.created_at
    }

    /// Returns a reference to the vault header (mode, salt, KDF params).
    pub fn header(&self) -> &VaultHeader {
        &self.header
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encrypted vaults need a non-empty passphrase; unencrypted ones ignore it.
fn resolve_passphrase(
    passphrase: Option<&str>,
    encrypted: bool,
) -> Result<Option<Zeroizing<Vec<u8>>>> {
    if !encrypted {
        if passphrase.is_some() {
            debug!("ignoring passphrase for unencrypted vault");
        }
        return Ok(None);
    }
    match passphrase {
        Some(p) if !p.is_empty() => Ok(Some(Zeroizing::new(p.as_bytes().to_vec()))),
        _ => Err(PwVaultError::Validation(
            "an encrypted vault requires a non-empty passphrase".into(),
        )),
    }
}

/// The mode the caller asked for must match the mode stored in the file.
fn check_mode(header: &VaultHeader, encrypted: bool) -> Result<()> {
    match (header.encrypted, encrypted) {
        (true, false) => Err(PwVaultError::InvalidVaultFormat(
            "vault is encrypted but was opened as unencrypted".into(),
        )),
        (false, true) => Err(PwVaultError::InvalidVaultFormat(
            "vault is not encrypted but was opened with a passphrase".into(),
        )),
        _ => Ok(()),
    }
}

/// Turn a raw file into records, decrypting first if needed.
fn decode_payload(raw: &RawVault, passphrase: Option<&Vec<u8>>) -> Result<RecordSet> {
    if !raw.header.encrypted {
        return codec::decode(&raw.payload);
    }

    let passphrase = passphrase.ok_or(PwVaultError::AuthenticationFailed)?;
    let (salt, kdf) = raw.header.key_material()?;
    let key = derive_key_with_params(passphrase, salt, kdf)?;

    let plaintext = Zeroizing::new(decrypt_with_aad(
        key.as_bytes(),
        &raw.payload,
        &raw.header_bytes,
    )?);
    codec::decode(&plaintext)
}

/// Build the complete file content for `records` under `header`.
fn encode_file(
    header: &VaultHeader,
    passphrase: Option<&Vec<u8>>,
    records: &RecordSet,
) -> Result<Zeroizing<Vec<u8>>> {
    let header_bytes = header.to_bytes()?;
    let plaintext = codec::encode(records)?;

    let payload = if header.encrypted {
        let passphrase = passphrase.ok_or_else(|| {
            PwVaultError::Validation("an encrypted vault requires a passphrase".into())
        })?;
        let (salt, kdf) = header.key_material()?;
        let key = derive_key_with_params(passphrase, salt, kdf)?;
        Zeroizing::new(encrypt_with_aad(key.as_bytes(), &plaintext, &header_bytes)?)
    } else {
        plaintext
    };

    format::build_vault(&header_bytes, &payload).map(Zeroizing::new)
}
