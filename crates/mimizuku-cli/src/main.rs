//! Mimizuku CLI main entry point

use anyhow::Result;
use clap::Parser;
use mimizuku_cli::{
    commands::{Cli, CommandExecutor, Commands},
    interactive::InteractiveSession,
};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut executor = CommandExecutor::new();
    executor.apply_globals(cli.input.as_deref(), cli.config.as_deref())?;

    // No subcommand, or an explicit request: start interactive mode
    let command = match cli.command {
        None | Some(Commands::Interactive) => {
            InteractiveSession::with_executor(executor).run()?;
            return Ok(());
        }
        Some(command) => command,
    };

    let result = executor.execute(command)?;

    // Exit with appropriate code
    if result.success {
        std::process::exit(0);
    } else {
        eprintln!("{}", result.message);
        std::process::exit(1);
    }
}
