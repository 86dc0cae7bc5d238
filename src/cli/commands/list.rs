//! `pwvault list`: show organizations and usernames.

use crate::accounts::AccountService;
use crate::cli::output;
use crate::cli::{load_settings, open_vault, vault_path, Cli};
use crate::errors::Result;
use crate::vault::VaultHandle;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;
    run(&vault)
}

pub fn run(vault: &VaultHandle) -> Result<()> {
    let accounts = AccountService::new(vault).list()?;
    output::print_accounts_table(&accounts);
    Ok(())
}
