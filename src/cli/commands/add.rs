//! `pwvault add`: create an account with a generated or typed password.

use dialoguer::Input;

use crate::accounts::AccountService;
use crate::cli::output;
use crate::cli::{audit, load_settings, open_vault, password_spec, vault_path, AddArgs, Cli};
use crate::config::Settings;
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &AddArgs) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;
    run(&vault, &settings, args)
}

/// Add the account to an open vault.
pub fn run(vault: &VaultHandle, settings: &Settings, args: &AddArgs) -> Result<()> {
    let org = args.organization.as_str();
    let service = AccountService::new(vault);

    // Only worth an extra read when a prompt would otherwise be wasted.
    let prompts = args.username.is_none() || args.password.set_password;
    if prompts && service.contains(org)? {
        return Err(PwVaultError::AccountAlreadyExists(org.to_string()));
    }

    let username = match &args.username {
        Some(u) => u.clone(),
        None => Input::<String>::new()
            .with_prompt(format!("Username for '{org}'"))
            .interact_text()
            .map_err(|e| PwVaultError::CommandFailed(format!("username prompt: {e}")))?,
    };

    let spec = password_spec(&args.password, settings)?;
    service.create(org, &username, &spec)?;

    audit(vault.path(), "add", Some(org), None);
    output::success(&format!("Added account for '{org}' (username: {username})"));
    if !args.password.set_password {
        output::tip(&format!("Run `pwvault get {org}` to copy the generated password."));
    }

    Ok(())
}
