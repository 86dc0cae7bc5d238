use clap::Parser;
use pwvault::cli::{commands, output, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so `get --print` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PWVAULT_LOG")
                .unwrap_or_else(|_| EnvFilter::new("pwvault=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add(ref args) => commands::add::execute(&cli, args),
        Commands::Get(ref args) => commands::get::execute(&cli, args),
        Commands::Rotate(ref args) => commands::rotate::execute(&cli, args),
        Commands::Delete(ref args) => commands::delete::execute(&cli, args),
        Commands::List => commands::list::execute(&cli),
        Commands::Passwd => commands::passwd::execute(&cli),
        Commands::Shell => commands::shell::execute(&cli),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        #[cfg(not(feature = "audit-log"))]
        Commands::Audit { .. } => Err(pwvault::errors::PwVaultError::CommandFailed(
            "pwvault was built without the audit-log feature".into(),
        )),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
