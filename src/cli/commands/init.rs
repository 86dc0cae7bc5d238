//! `pwvault init`: create a new, empty vault.

use std::fs;

use crate::cli::output;
use crate::cli::{audit, load_settings, prompt_new_passphrase, vault_path, Cli, PASSPHRASE_ENV};
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    // 1. Refuse to touch an existing file.
    if path.exists() {
        output::tip("Use `pwvault add <ORG>` to add accounts to the existing vault.");
        return Err(PwVaultError::VaultAlreadyExists(path));
    }

    // 2. Create the parent directory if it doesn't exist.
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            output::info(&format!("Created directory: {}", parent.display()));
        }
    }

    // 3. Create the vault file.
    let vault = if cli.no_encrypt {
        output::warning("Creating an UNENCRYPTED vault — passwords are stored in plain text.");
        VaultHandle::create_new(&path, None, false, None)?
    } else {
        let kdf = settings.kdf_params()?;
        let passphrase = prompt_new_passphrase(PASSPHRASE_ENV)?;
        VaultHandle::create_new(&path, Some(passphrase.as_str()), true, Some(&kdf))?
    };

    let mode = if vault.is_encrypted() {
        "encrypted"
    } else {
        "plaintext"
    };
    audit(&path, "init", None, Some(mode));

    output::success(&format!("Vault created at {}", path.display()));
    output::tip("Run `pwvault add <ORG>` to add your first account.");

    Ok(())
}
