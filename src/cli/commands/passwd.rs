//! `pwvault passwd`: change the vault passphrase.
//!
//! Every record is re-encrypted under a key derived from the new
//! passphrase and a fresh salt; the file is replaced atomically.

use crate::cli::output;
use crate::cli::{
    audit, load_settings, open_vault, prompt_new_passphrase, vault_path, Cli, NEW_PASSPHRASE_ENV,
};
use crate::errors::{PwVaultError, Result};

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    if cli.no_encrypt {
        return Err(PwVaultError::Validation(
            "an unencrypted vault has no passphrase to change".into(),
        ));
    }

    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    // 1. Open with the current passphrase.
    let mut vault = open_vault(cli, &path)?;

    // 2. Choose the new one and re-encrypt.
    output::info("Choose the new vault passphrase.");
    let new_passphrase = prompt_new_passphrase(NEW_PASSPHRASE_ENV)?;
    vault.change_passphrase(&new_passphrase, None)?;

    audit(&path, "passwd", None, None);
    output::success("Vault passphrase changed");

    Ok(())
}
