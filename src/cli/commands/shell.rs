//! `pwvault shell`: open the vault once, then read commands from stdin.

use std::io;

use crate::cli::shell::run_shell;
use crate::cli::{load_settings, open_vault, output, vault_path, Cli};
use crate::errors::Result;

/// Execute the `shell` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let vault = open_vault(cli, &path)?;

    output::info(&format!(
        "Opened {} — type `help` for commands, `quit` to leave.",
        path.display()
    ));
    run_shell(&vault, &settings, io::stdin().lock())
}
