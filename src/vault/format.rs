//! Binary vault file format and atomic file replacement.
//!
//! A vault file has this layout:
//!
//! ```text
//! [PWVT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][payload]
//! ```
//!
//! - **Magic** (`PWVT`): identifies the file as a pwvault vault.
//! - **Version**: envelope format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the payload begins.
//! - **Header JSON**: serialized `VaultHeader` (mode, salt, KDF params).
//! - **Payload**: the encoded record set, either as-is (unencrypted
//!   vault) or as an AES-256-GCM token whose associated data is the
//!   exact header bytes (encrypted vault).
//!
//! Files are only ever replaced whole: the new content goes to a temp
//! file in the same directory, is fsynced, and is renamed over the target.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::crypto::kdf::MIN_SALT_LEN;
use crate::crypto::KdfParams;
use crate::errors::{PwVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PWVT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Plaintext metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// Whether the payload is encrypted.
    pub encrypted: bool,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,

    /// Per-vault random salt for key derivation (base64 in JSON).
    /// Present if and only if the vault is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_option")]
    pub salt: Option<Vec<u8>>,

    /// KDF algorithm and cost used for this vault.
    /// Present if and only if the vault is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfParams>,
}

impl VaultHeader {
    /// Header for a new unencrypted vault.
    pub fn plaintext() -> Self {
        Self {
            version: CURRENT_VERSION,
            encrypted: false,
            created_at: Utc::now(),
            salt: None,
            kdf: None,
        }
    }

    /// Header for a new encrypted vault.
    pub fn encrypted(salt: Vec<u8>, kdf: KdfParams) -> Self {
        Self {
            version: CURRENT_VERSION,
            encrypted: true,
            created_at: Utc::now(),
            salt: Some(salt),
            kdf: Some(kdf),
        }
    }

    /// Salt and KDF params of an encrypted vault.
    pub fn key_material(&self) -> Result<(&[u8], &KdfParams)> {
        match (&self.salt, &self.kdf) {
            (Some(salt), Some(kdf)) if self.encrypted => Ok((salt.as_slice(), kdf)),
            _ => Err(PwVaultError::InvalidVaultFormat(
                "vault header has no key derivation parameters".into(),
            )),
        }
    }

    /// Serialize to the exact bytes written to (and authenticated in) the file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| PwVaultError::SerializationError(format!("header: {e}")))
    }

    fn check_consistent(&self) -> Result<()> {
        if self.version != CURRENT_VERSION {
            return Err(PwVaultError::InvalidVaultFormat(format!(
                "header version {} does not match envelope version {CURRENT_VERSION}",
                self.version
            )));
        }
        match (self.encrypted, &self.salt, &self.kdf) {
            (false, None, None) => Ok(()),
            (true, Some(salt), Some(kdf)) => {
                if salt.len() < MIN_SALT_LEN {
                    return Err(PwVaultError::InvalidVaultFormat(format!(
                        "salt is {} bytes, expected at least {MIN_SALT_LEN}",
                        salt.len()
                    )));
                }
                // Out-of-range costs are a format error, never a derivation attempt.
                kdf.validate()
                    .map_err(|e| PwVaultError::InvalidVaultFormat(format!("header kdf: {e}")))
            }
            (true, _, _) => Err(PwVaultError::InvalidVaultFormat(
                "encrypted vault is missing its salt or KDF parameters".into(),
            )),
            (false, _, _) => Err(PwVaultError::InvalidVaultFormat(
                "unencrypted vault carries key derivation parameters".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// SHA-256 of a vault file's exact bytes.
///
/// Two reads returning the same revision saw the same file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision([u8; 32]);

impl Revision {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&Sha256::digest(bytes));
        Self(hash)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..6] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A vault file split into its parts, with the raw header bytes kept
/// so the payload can be authenticated against exactly what is on disk.
pub struct RawVault {
    pub header: VaultHeader,
    pub header_bytes: Vec<u8>,
    pub payload: Vec<u8>,
    pub revision: Revision,
}

/// Read a vault file from disk and split it into header and payload.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    let data = read_file(path)?;
    parse_vault(&data)
}

/// Hash the current content of a vault file without parsing it.
pub fn read_revision(path: &Path) -> Result<Revision> {
    read_file(path).map(|data| Revision::of(&data))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PwVaultError::VaultNotFound(path.to_path_buf()),
        _ => PwVaultError::Io(e),
    })
}

/// Parse an in-memory vault file.
pub fn parse_vault(data: &[u8]) -> Result<RawVault> {
    if data.len() < PREFIX_LEN {
        return Err(PwVaultError::InvalidVaultFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(PwVaultError::InvalidVaultFormat(
            "missing PWVT magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(PwVaultError::InvalidVaultFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| PwVaultError::InvalidVaultFormat("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32).map_err(|_| {
        PwVaultError::InvalidVaultFormat(format!(
            "header length {header_len_u32} exceeds platform address space"
        ))
    })?;

    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            PwVaultError::InvalidVaultFormat("header length exceeds file size".into())
        })?;

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let payload = data[header_end..].to_vec();

    let header: VaultHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| PwVaultError::InvalidVaultFormat(format!("header JSON: {e}")))?;
    header.check_consistent()?;

    Ok(RawVault {
        header,
        header_bytes,
        payload,
        revision: Revision::of(data),
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Assemble the full file content from header bytes and payload.
pub fn build_vault(header_bytes: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        PwVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len() + payload.len());
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(header_bytes);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Replace the file at `path` with `bytes` atomically.
///
/// Readers see either the old complete file or the new complete file.
/// If anything fails before the rename, the old file is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = write_temp(path, bytes)?;
    tmp.persist(path).map_err(|e| PwVaultError::Io(e.error))?;
    sync_parent_dir(path);
    Ok(())
}

/// Like `write_atomic`, but never replaces an existing file.
///
/// Fails with `VaultAlreadyExists` if `path` exists at rename time.
pub fn write_new_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = write_temp(path, bytes)?;
    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            PwVaultError::VaultAlreadyExists(path.to_path_buf())
        } else {
            PwVaultError::Io(e.error)
        }
    })?;
    sync_parent_dir(path);
    Ok(())
}

/// Write `bytes` to a fresh temp file next to `path` and fsync it.
///
/// The temp file lives in the same directory so the final rename stays
/// on one filesystem. On Unix it is created with mode 0600.
fn write_temp(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let parent = parent_dir(path);
    let prefix = format!(
        ".{}.",
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Persist the rename itself. Best effort: the data is already safe.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        let parent = parent_dir(path);
        if let Err(e) = fs::File::open(&parent).and_then(|dir| dir.sync_all()) {
            tracing::debug!(dir = %parent.display(), error = %e, "could not fsync vault directory");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

// ---------------------------------------------------------------------------
// Serde helper for the base64-encoded optional salt
// ---------------------------------------------------------------------------

mod base64_option {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| BASE64.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
