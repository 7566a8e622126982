// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use envbuilder::builder::Builder;
use envbuilder::config::{Config, Options};
use envbuilder::juju::JujuCli;
use envbuilder::process::SystemRunner;

/// Set up, reset and tear down Juju environments for bundle tests
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// YAML test configuration
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bootstrap the environment if it is not running, then connect to it
    Bootstrap,
    /// Deploy a bundle with juju-deployer
    Deploy {
        /// Bundle file, defaults to --bundle
        bundle: Option<PathBuf>,
    },
    /// Remove all services and wait until they are gone
    Reset,
    /// Destroy the environment
    Destroy,
    /// Create a virtualenv
    Virtualenv { path: PathBuf },
    /// Add the configured apt sources and install the configured packages
    Install {
        /// Skip refreshing the package index after adding sources
        #[arg(long)]
        no_update: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG takes precedence over --verbose
    let default_level = if args.options.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    info!(
        "Configuration loaded: environment={}",
        args.options.environment.as_deref().unwrap_or("<none>")
    );

    let mut builder = Builder::new(config, args.options, SystemRunner, |env| {
        JujuCli::new(env, SystemRunner)
    });

    match args.command {
        Command::Bootstrap => {
            if builder.bootstrap().await? {
                info!("Environment bootstrapped");
            }
        }
        Command::Deploy { bundle } => {
            let result = builder.deploy(bundle.as_deref()).await?;
            if let Some(output) = &result.output {
                print!("{}", output);
            }
            if result.returncode != 0 {
                warn!(
                    "{} exited with {}",
                    result.executable.join(" "),
                    result.returncode
                );
                std::process::exit(result.returncode);
            }
        }
        Command::Reset => {
            if builder.environment().is_none() {
                warn!("No environment given, nothing to reset");
            }
            builder.reset().await.context("Failed to reset environment")?;
        }
        Command::Destroy => builder.destroy().await?,
        Command::Virtualenv { path } => builder.build_virtualenv(&path).await?,
        Command::Install { no_update } => {
            builder.add_sources(!no_update).await?;
            builder.install_packages().await?;
        }
    }

    Ok(())
}
