//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dirsync - Mirror a directory to a server over HTTP
#[derive(Parser, Debug)]
#[command(name = "dirsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "DIRSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch a directory and push every change to a server
    ///
    /// Examples:
    ///   dirsync client ./docs
    ///   dirsync client ./docs --server http://backup:5000 --interval 10
    Client {
        /// Directory to watch; must exist
        dir: PathBuf,

        /// Server base URL
        #[arg(short, long)]
        server: Option<String>,

        /// Seconds between scans
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many scans instead of running until ctrl-c
        #[arg(long)]
        iterations: Option<usize>,
    },

    /// Receive changes into a directory
    ///
    /// Examples:
    ///   dirsync server ./mirror
    ///   dirsync server ./mirror --bind 0.0.0.0:5000
    Server {
        /// Directory to write into; created if missing
        dir: PathBuf,

        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Write the effective configuration to a file
    ///
    /// The format follows the extension (.toml, .json, .yaml).
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}
