// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! br: the batchrun pipeline CLI.

mod commands;
mod env;
mod exit_error;
mod load;

use clap::Parser;
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "br", about = "Parallel campaign batch runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Execute a campaign batch
    Run(commands::run::RunArgs),
    /// Inspect and manage checkpoint snapshots
    Checkpoints(commands::checkpoints::CheckpointsArgs),
}

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; stdout is reserved for the summary lines
    // the job server scrapes.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "br=info,br_engine=info,br_storage=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => commands::run::handle(args).await,
        Command::Checkpoints(args) => commands::checkpoints::handle(args.command),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if let Some(message) = &exit.message {
                    eprintln!("{message}");
                }
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
