// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! custreg - customer registration service with a transactional outbox.
//!
//! This is the binary entry point.

mod relay;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use custreg_config::RegistryConfig;

/// custreg - customer registration service with a transactional outbox.
#[derive(Parser, Debug)]
#[command(name = "custreg", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the REST gateway and the outbox relay.
    Serve,
    /// Run the outbox relay without the gateway.
    Relay {
        /// Run a single cycle, print its report and exit.
        #[arg(long)]
        once: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> RegistryConfig {
    let loaded = match path {
        Some(path) => custreg_config::load_and_validate_path(path),
        None => custreg_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            custreg_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Relay { once: true }) => relay::run_once(config).await,
        Some(Commands::Relay { once: false }) => relay::run_relay(config).await,
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                Ok(())
            }
            Err(e) => Err(custreg_core::RegistryError::Config(format!(
                "failed to render configuration: {e}"
            ))),
        },
        None => {
            println!("custreg: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("custreg: {e}");
        std::process::exit(1);
    }
}
