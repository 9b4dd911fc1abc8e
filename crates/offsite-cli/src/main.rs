//! Offsite CLI - unattended directory backups over SSH/SFTP.

mod cli;
mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Operational tracing (connection progress, server banners, host-key
    // events) is opt-in via RUST_LOG and goes to stderr so it never mixes
    // with JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match &cli.command {
        cli::Commands::Run(args) => commands::run::execute(args, &*formatter),
        cli::Commands::Archive(args) => commands::archive::execute(args, &*formatter),
        cli::Commands::Key(args) => commands::key::execute(args, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}
