// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf`: command-line client of the plugin build daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_lifecycle;
mod client_queries;
mod color;
mod commands;
mod exit_error;
mod output;

use clap::{CommandFactory, Parser, Subcommand};

use crate::client::DaemonClient;
use crate::commands::{artifact, build, daemon, logs, plugin, status};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "pf", version, about = "Build WebAssembly plugins from source archives")]
#[command(styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(long = "output", global = true, value_enum, default_value_t)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, list, rename and remove plugins
    Plugin(plugin::PluginArgs),
    /// Submit a source archive for building
    Build(build::BuildArgs),
    /// Show the daemon's builds, or the builds of one plugin
    Status {
        /// Plugin ID
        plugin_id: Option<String>,
    },
    /// Follow build output of a plugin, or print the last build's output
    Logs(logs::LogsArgs),
    /// Fetch the last built binary of a plugin
    Artifact(artifact::ArtifactArgs),
    /// Fetch the last uploaded source archive of a plugin
    Source(artifact::SourceArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("{}", exit.message);
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let client = DaemonClient::connect()?;
    let format = cli.format;
    match command {
        Commands::Plugin(args) => plugin::handle(args.command, &client, format).await,
        Commands::Build(args) => build::handle(args, &client, format).await,
        Commands::Status { plugin_id } => status::handle(plugin_id, &client, format).await,
        Commands::Logs(args) => logs::handle(args, &client, format).await,
        Commands::Artifact(args) => artifact::handle(args, &client, format).await,
        Commands::Source(args) => artifact::handle_source(args, &client, format).await,
        Commands::Daemon(args) => daemon::daemon(args, &client).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
