//! `pwvault delete`: remove an account from the vault.

use dialoguer::Confirm;

use crate::accounts::AccountService;
use crate::cli::output;
use crate::cli::{audit, load_settings, open_vault, vault_path, Cli, DeleteArgs};
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, args: &DeleteArgs) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;
    run(&vault, args)
}

/// Delete the account from an open vault.
pub fn run(vault: &VaultHandle, args: &DeleteArgs) -> Result<()> {
    let org = args.organization.as_str();

    // Unless --yes is set, ask for confirmation before deleting.
    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete account for '{org}'?"))
            .default(false)
            .interact()
            .map_err(|e| PwVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    AccountService::new(vault).delete(org)?;

    audit(vault.path(), "delete", Some(org), None);
    output::success(&format!("Deleted account for '{org}'"));

    Ok(())
}
