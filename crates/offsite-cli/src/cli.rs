//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "offsite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full backup: archive, upload, remove the local copy
    Run(RunArgs),
    /// Build the archive without uploading it
    Archive(ArchiveArgs),
    /// Show the SSH key fingerprint and authorized_keys line
    Key(KeyArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to the backup configuration file
    #[arg(value_name = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Keep the local archive after a successful upload
    #[arg(long)]
    pub keep_local: bool,
}

#[derive(clap::Args)]
pub struct ArchiveArgs {
    /// Directory tree to archive
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory the archive is written to (default: OS temp dir)
    #[arg(long, value_name = "DIR")]
    pub dest_dir: Option<PathBuf>,

    /// Archive filename prefix
    #[arg(long, default_value = "backup")]
    pub prefix: String,
}

#[derive(clap::Args)]
pub struct KeyArgs {
    /// Path to the SSH private key (default: standard ~/.ssh locations)
    #[arg(long, value_name = "FILE")]
    pub key_path: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
