//! `pwvault rotate`: replace an account's password.

use crate::accounts::AccountService;
use crate::cli::output;
use crate::cli::{audit, load_settings, open_vault, password_spec, vault_path, Cli, RotateArgs};
use crate::config::Settings;
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `rotate` command.
pub fn execute(cli: &Cli, args: &RotateArgs) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;
    run(&vault, &settings, args)
}

/// Rotate the password in an open vault.
pub fn run(vault: &VaultHandle, settings: &Settings, args: &RotateArgs) -> Result<()> {
    let org = args.organization.as_str();
    let service = AccountService::new(vault);

    // Don't ask for a password that can't be stored.
    if args.password.set_password && !service.contains(org)? {
        return Err(PwVaultError::AccountNotFound(org.to_string()));
    }

    let spec = password_spec(&args.password, settings)?;
    service.rotate(org, &spec)?;

    audit(vault.path(), "rotate", Some(org), None);
    output::success(&format!("Rotated password for '{org}'"));

    Ok(())
}
