//! Interactive session over an already-open vault.
//!
//! Each input line is split on whitespace and parsed by a multicall
//! `clap` parser, so the first word names the command and the shell gets
//! `help` and per-command `--help` for free.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};

use crate::cli::commands::{add, delete, get, list, rotate};
use crate::cli::output;
use crate::cli::{AddArgs, DeleteArgs, GetArgs, RotateArgs};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::VaultHandle;

const PROMPT: &str = "pwvault> ";

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// Commands accepted inside `pwvault shell`.
#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Add an account
    Add(AddArgs),
    /// Show an account
    Get(GetArgs),
    /// Replace an account's password
    Rotate(RotateArgs),
    /// Delete an account
    Delete(DeleteArgs),
    /// List organizations and usernames
    List,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<std::result::Result<ShellCommand, clap::Error>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    Some(ShellLine::try_parse_from(words).map(|parsed| parsed.command))
}

/// Read commands from `input` until `quit` or end of input.
///
/// A failing command prints its error and the session continues.
pub fn run_shell<R: BufRead>(vault: &VaultHandle, settings: &Settings, input: R) -> Result<()> {
    prompt()?;
    for line in input.lines() {
        let line = line?;
        match parse_line(&line) {
            None => {}
            Some(Err(e)) => {
                let _ = e.print();
            }
            Some(Ok(ShellCommand::Quit)) => return Ok(()),
            Some(Ok(command)) => {
                if let Err(e) = dispatch(vault, settings, &command) {
                    output::error(&e.to_string());
                }
            }
        }
        prompt()?;
    }
    println!();
    Ok(())
}

fn dispatch(vault: &VaultHandle, settings: &Settings, command: &ShellCommand) -> Result<()> {
    match command {
        ShellCommand::Add(args) => add::run(vault, settings, args),
        ShellCommand::Get(args) => get::run(vault, args),
        ShellCommand::Rotate(args) => rotate::run(vault, settings, args),
        ShellCommand::Delete(args) => delete::run(vault, args),
        ShellCommand::List => list::run(vault),
        ShellCommand::Quit => Ok(()),
    }
}

fn prompt() -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{PROMPT}")?;
    stdout.flush()?;
    Ok(())
}
