//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;
pub mod shell;

use std::path::{Path, PathBuf};

use clap::Parser;

use zeroize::Zeroizing;

use crate::accounts::PasswordSpec;
use crate::config::Settings;
use crate::errors::{PwVaultError, Result};
use crate::vault::VaultHandle;

/// Minimum passphrase length for new vaults.
const MIN_PASSPHRASE_LEN: usize = 8;

/// How many times an interactive user may retype a wrong passphrase.
const MAX_PASSPHRASE_ATTEMPTS: usize = 3;

/// Environment variable holding the vault passphrase for scripted use.
pub const PASSPHRASE_ENV: &str = "PWVAULT_PASSPHRASE";

/// Environment variable holding the new passphrase for a scripted `passwd`.
pub const NEW_PASSPHRASE_ENV: &str = "PWVAULT_NEW_PASSPHRASE";

/// pwvault: a local, encrypted password vault.
#[derive(Parser)]
#[command(name = "pwvault", about = "Local encrypted password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `vault_file` from .pwvault.toml, or vault.pwv)
    #[arg(short = 'f', long = "file", env = "PWVAULT_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Operate on an unencrypted vault (no passphrase)
    #[arg(long, global = true)]
    pub no_encrypt: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Add an account (generates a password unless --set-password)
    Add(AddArgs),

    /// Show an account's username and copy its password to the clipboard
    Get(GetArgs),

    /// Replace an account's password
    Rotate(RotateArgs),

    /// Delete an account
    Delete(DeleteArgs),

    /// List organizations and usernames
    List,

    /// Change the vault passphrase (re-encrypts the vault)
    Passwd,

    /// Open the vault once and run commands interactively
    Shell,

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum, ignore_case = true)]
        shell: clap_complete::Shell,
    },
}

/// How the password of an account is chosen.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PasswordArgs {
    /// Length of the generated password
    #[arg(short, long)]
    pub length: Option<usize>,

    /// Characters the generated password is drawn from
    #[arg(short, long)]
    pub alphabet: Option<String>,

    /// Type the password instead of generating one
    #[arg(short = 's', long)]
    pub set_password: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    /// Organization the account belongs to (e.g. Gmail)
    pub organization: String,

    /// Username (prompted for when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GetArgs {
    /// Organization to look up
    pub organization: String,

    /// Print the password instead of copying it to the clipboard
    #[arg(short, long)]
    pub print: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RotateArgs {
    /// Organization whose password is replaced
    pub organization: String,

    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Organization to delete
    pub organization: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a passphrase from the environment, if set and non-empty.
fn passphrase_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Get the vault passphrase: `PWVAULT_PASSPHRASE` first, then a prompt.
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(PASSPHRASE_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault passphrase")
        .interact()
        .map_err(|e| PwVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation (used by `init` and `passwd`).
///
/// `env_var` is checked first for scripted usage.
/// Enforces a minimum passphrase length.
pub fn prompt_new_passphrase(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(env_var) {
        check_new_passphrase(&pw)?;
        return Ok(pw);
    }

    loop {
        let pw = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault passphrase")
                .with_confirmation(
                    "Confirm vault passphrase",
                    "Passphrases do not match, try again",
                )
                .interact()
                .map_err(|e| PwVaultError::CommandFailed(format!("passphrase prompt: {e}")))?,
        );

        match check_new_passphrase(&pw) {
            Ok(()) => return Ok(pw),
            Err(e) => output::warning(&format!("{e}. Try again.")),
        }
    }
}

fn check_new_passphrase(pw: &str) -> Result<()> {
    if pw.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(PwVaultError::Validation(format!(
            "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
        )));
    }
    Ok(())
}

/// Load `.pwvault.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    Settings::load(&std::env::current_dir()?)
}

/// Resolve the vault file: `--file` / `PWVAULT_FILE`, else the configured default.
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.file {
        Some(file) => cwd.join(file),
        None => settings.vault_path(&cwd),
    })
}

/// Open the vault at `path` in the mode selected on the command line.
///
/// A wrong passphrase typed at the prompt may be retried a few times;
/// every other error aborts immediately. A passphrase taken from
/// `PWVAULT_PASSPHRASE` gets exactly one attempt.
pub fn open_vault(cli: &Cli, path: &Path) -> Result<VaultHandle> {
    if cli.no_encrypt {
        return VaultHandle::open(path, None, false);
    }

    // Missing files and mode mismatches are reported before prompting.
    let raw = crate::vault::format::read_vault(path)?;
    if !raw.header.encrypted {
        return VaultHandle::open(path, None, true);
    }

    if let Some(pw) = passphrase_from_env(PASSPHRASE_ENV) {
        return VaultHandle::open(path, Some(pw.as_str()), true);
    }

    let mut attempt = 1;
    loop {
        let pw = prompt_passphrase()?;
        match VaultHandle::open(path, Some(pw.as_str()), true) {
            Err(PwVaultError::AuthenticationFailed) if attempt < MAX_PASSPHRASE_ATTEMPTS => {
                output::warning("Wrong passphrase, try again.");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Turn the password flags into a `PasswordSpec`, prompting for `-s`.
pub fn password_spec(args: &PasswordArgs, settings: &Settings) -> Result<PasswordSpec> {
    if args.set_password {
        let pw = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Account password")
                .with_confirmation("Confirm account password", "Passwords do not match")
                .interact()
                .map_err(|e| PwVaultError::CommandFailed(format!("password prompt: {e}")))?,
        );
        return Ok(PasswordSpec::literal(&pw));
    }

    Ok(PasswordSpec::random(
        args.length.unwrap_or(settings.password_length),
        args.alphabet.as_deref().unwrap_or(&settings.alphabet),
    ))
}

/// Record a vault operation in the audit log (no-op without `audit-log`).
pub fn audit(vault_path: &Path, op: &str, organization: Option<&str>, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(vault_path, op, organization, details);

    #[cfg(not(feature = "audit-log"))]
    let _ = (vault_path, op, organization, details);
}
