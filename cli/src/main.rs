mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    capture::CaptureCommand, extensions::ExtensionsCommand, inspect::InspectCommand,
    restore::RestoreCommand,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "dirsnap",
    version,
    about = "Capture a directory into a single portable snapshot file",
    long_about = "Dirsnap captures a filtered directory tree into one container file, optionally password protected, and recreates the tree from it later"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, env = "DIRSNAP_PASSWORD", hide_env_values = true, help = "Container password")]
    password: Option<String>,

    #[arg(long, global = true, env = "DIRSNAP_CONFIG", help = "Settings file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Scan a directory and save it as a snapshot container")]
    Capture(CaptureCommand),

    #[command(about = "Recreate a directory tree from a snapshot container")]
    Restore(RestoreCommand),

    #[command(about = "Show the contents of a snapshot container")]
    Inspect(InspectCommand),

    #[command(about = "Manage the file extension allow-list")]
    Extensions(ExtensionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    debug!("Starting dirsnap");

    match cli.command {
        Commands::Capture(ref cmd) => cmd.run(&cli).await,
        Commands::Restore(ref cmd) => cmd.run(&cli).await,
        Commands::Inspect(ref cmd) => cmd.run(&cli).await,
        Commands::Extensions(ref cmd) => cmd.run(&cli),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!(
            "dirsnap={},dirsnap_core={}",
            level, level
        )))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}
