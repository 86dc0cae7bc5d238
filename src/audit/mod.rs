//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every vault operation (init, add, rotate, delete,
//! passwd, ...) in a local SQLite database next to the vault file:
//! `<dir>/.<vault file name>.audit.db`. Passwords are never recorded.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{PwVaultError, Result};

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub vault: String,
    pub organization: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `db_path`.
    ///
    /// Returns `None` if the database can't be opened: callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(db_path: &Path) -> Option<Self> {
        let conn = Connection::open(db_path).ok()?;

        // Set restrictive permissions on the audit database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp    TEXT NOT NULL,
                operation    TEXT NOT NULL,
                vault        TEXT NOT NULL,
                organization TEXT,
                details      TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Open the audit database that belongs to the vault at `vault_path`.
    pub fn open_for_vault(vault_path: &Path) -> Option<Self> {
        Self::open(&Self::db_path(vault_path))
    }

    /// Path of the audit database for a vault: a hidden sibling file.
    pub fn db_path(vault_path: &Path) -> PathBuf {
        let name = vault_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vault".to_string());
        vault_path.with_file_name(format!(".{name}.audit.db"))
    }

    /// Record an operation. Fire-and-forget: errors are silently ignored.
    pub fn log(
        &self,
        operation: &str,
        vault: &str,
        organization: Option<&str>,
        details: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, vault, organization, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, vault, organization, details],
        );
    }

    /// Query recent audit entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries newer than this timestamp.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let (sql, params): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match since {
            Some(ref ts) => (
                "SELECT id, timestamp, operation, vault, organization, details
                 FROM audit_log
                 WHERE timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
                vec![
                    Box::new(ts.to_rfc3339()) as Box<dyn rusqlite::types::ToSql>,
                    Box::new(limit_i64),
                ],
            ),
            None => (
                "SELECT id, timestamp, operation, vault, organization, details
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
                vec![Box::new(limit_i64) as Box<dyn rusqlite::types::ToSql>],
            ),
        };

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| PwVaultError::AuditError(format!("query prepare: {e}")))?;

        let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| &**p).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    vault: row.get(3)?,
                    organization: row.get(4)?,
                    details: row.get(5)?,
                })
            })
            .map_err(|e| PwVaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| PwVaultError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }
}

/// Convenience helper: log an audit event for the vault at `vault_path`.
///
/// Opens the audit database, logs the event, and silently ignores any errors.
/// This is safe to call from any command: it never fails the parent operation.
pub fn log_audit(vault_path: &Path, op: &str, organization: Option<&str>, details: Option<&str>) {
    let vault = vault_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match AuditLog::open_for_vault(vault_path) {
        Some(audit) => audit.log(op, &vault, organization, details),
        None => tracing::debug!(vault = %vault, "audit log unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_in(dir: &TempDir) -> AuditLog {
        AuditLog::open_for_vault(&dir.path().join("v.pwv")).unwrap()
    }

    #[test]
    fn db_path_is_hidden_sibling() {
        let path = AuditLog::db_path(Path::new("/home/me/vault.pwv"));
        assert_eq!(path, PathBuf::from("/home/me/.vault.pwv.audit.db"));
    }

    #[test]
    fn open_creates_database() {
        let dir = TempDir::new().unwrap();
        let _audit = open_in(&dir);
        assert!(dir.path().join(".v.pwv.audit.db").exists());
    }

    #[test]
    fn log_and_query_roundtrip() {
        let dir = TempDir::new().unwrap();
        let audit = open_in(&dir);

        audit.log("add", "v.pwv", Some("Gmail"), None);
        audit.log("add", "v.pwv", Some("Twitter"), None);
        audit.log("delete", "v.pwv", Some("Gmail"), None);

        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 3);

        // Most recent first.
        assert_eq!(entries[0].operation, "delete");
        assert_eq!(entries[0].organization.as_deref(), Some("Gmail"));
        assert_eq!(entries[2].organization.as_deref(), Some("Gmail"));
    }

    #[test]
    fn query_with_limit() {
        let dir = TempDir::new().unwrap();
        let audit = open_in(&dir);

        for i in 0..10 {
            audit.log("add", "v.pwv", Some(&format!("Org{i}")), None);
        }

        assert_eq!(audit.query(3, None).unwrap().len(), 3);
    }

    #[test]
    fn query_with_since_filter() {
        let dir = TempDir::new().unwrap();
        let audit = open_in(&dir);

        audit.log("init", "v.pwv", None, Some("encrypted"));

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(audit.query(10, Some(future)).unwrap().is_empty());
    }

    #[test]
    fn log_audit_helper_writes_next_to_vault() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("v.pwv");
        log_audit(&vault, "rotate", Some("Gmail"), None);

        let entries = AuditLog::open_for_vault(&vault)
            .unwrap()
            .query(10, None)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vault, "v.pwv");
    }

    #[test]
    fn open_returns_none_on_bad_path() {
        let result = AuditLog::open(Path::new("/nonexistent/path/that/does/not/exist/a.db"));
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let _audit = open_in(&dir);

        let perms = std::fs::metadata(dir.path().join(".v.pwv.audit.db"))
            .unwrap()
            .permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
