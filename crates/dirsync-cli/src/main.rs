//! dirsync CLI
//!
//! Runs either side of the sync: `dirsync client <dir>` or
//! `dirsync server <dir>`.

mod cli;
mod error;

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use dirsync_core::SyncConfig;
use dirsync_fs::ConfigStore;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = SyncConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Client {
            dir,
            server,
            interval,
            iterations,
        } => {
            if let Some(server) = server {
                config.client.server_url = server;
            }
            if let Some(interval) = interval {
                config.client.interval_secs = interval;
            }
            let root = existing_dir(&dir)?;
            let runtime = tokio::runtime::Runtime::new()?;
            println!("{} {}", "Synchronising".green().bold(), root.display());
            runtime.block_on(dirsync_client::run_client(&root, &config.client, iterations))?;
        }
        Commands::Server { dir, bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            std::fs::create_dir_all(&dir)?;
            let root = existing_dir(&dir)?;
            let runtime = tokio::runtime::Runtime::new()?;
            println!(
                "{} {} on {}",
                "Serving".green().bold(),
                root.display(),
                config.server.bind.cyan()
            );
            runtime.block_on(dirsync_server::serve(&root, &config.server))?;
        }
        Commands::InitConfig { path } => {
            ConfigStore::new().save(&path, &config)?;
            println!("{} {}", "Wrote".green().bold(), path.display());
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "dirsync=debug" } else { "dirsync=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("Verbose mode enabled");
    Ok(())
}

/// Absolute form of `dir`, which must be an existing directory.
fn existing_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(CliError::user(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }
    Ok(dunce::canonicalize(dir)?)
}
