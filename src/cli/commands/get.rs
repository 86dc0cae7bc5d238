//! `pwvault get`: show a username and hand over the password.
//!
//! By default the password goes to the system clipboard; `--print`
//! writes it to stdout instead.

use crate::accounts::AccountService;
use crate::cli::output;
use crate::cli::{audit, load_settings, open_vault, vault_path, Cli, GetArgs};
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `get` command.
pub fn execute(cli: &Cli, args: &GetArgs) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;
    run(&vault, args)
}

/// Look the account up in an open vault.
pub fn run(vault: &VaultHandle, args: &GetArgs) -> Result<()> {
    let org = args.organization.as_str();
    let credentials = AccountService::new(vault).fetch(org)?;

    audit(vault.path(), "get", Some(org), None);

    output::info(&format!("Username: {}", credentials.username));
    if args.print {
        println!("{}", credentials.password.as_str());
    } else {
        copy_to_clipboard(&credentials.password)?;
        output::success(&format!("Password for '{org}' copied to clipboard"));
    }

    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| {
        output::tip("Use `--print` to write the password to stdout instead.");
        PwVaultError::ClipboardError(e.to_string())
    })?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| PwVaultError::ClipboardError(e.to_string()))
}
