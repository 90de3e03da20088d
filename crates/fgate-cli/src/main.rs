//! # fgate CLI entry point
//!
//! Parses arguments, initialises logging and dispatches to the handlers in
//! [`fgate_cli::commands`].

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fgate_cli::client::ApiClient;
use fgate_cli::commands::{run, Command};

/// fgate command-line client.
///
/// Uploads files through a running fgate API, lists what has been
/// committed and streams files back to disk.
#[derive(Parser, Debug)]
#[command(name = "fgate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the fgate API.
    #[arg(
        long,
        env = "FGATE_API_URL",
        default_value = "http://127.0.0.1:8080",
        global = true
    )]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match ApiClient::new(&cli.api_url) {
        Ok(client) => run(&client, &cli.command, &mut std::io::stdout()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
