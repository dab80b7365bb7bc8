use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Trellis: plugin lifecycle tooling
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Config file (JSON, TOML or YAML). Falls back to $TRELLIS_CONFIG, then
    /// trellis.{toml,yaml,json} in the working directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Simple ping command for testing
    #[arg(long)]
    pub ping: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a downloaded plugin package
    Verify {
        /// The package on disk
        file: PathBuf,
        /// URL the package was downloaded from
        #[arg(long)]
        url: Option<String>,
        /// Checksum hint: a hex digest, a checksum-file URL, or the checksum
        /// suffix (e.g. `.sha512`) to use the file next to the package
        #[arg(long)]
        checksum: Option<String>,
        #[arg(long)]
        plugin_id: Option<String>,
        #[arg(long)]
        plugin_version: Option<String>,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },
    /// List extensions declared by the classes of a jar/zip or classes directory
    Scan {
        /// Archive or classes directory
        path: PathBuf,
        /// Scan classes on all cores
        #[arg(long)]
        parallel: bool,
        /// Print JSON instead of one line per extension
        #[arg(long)]
        json: bool,
    },
    /// Print the startup order of a module-set file
    Order {
        /// Module-set file (JSON, TOML or YAML)
        modules: PathBuf,
        /// Print the shutdown order instead
        #[arg(long)]
        shutdown: bool,
    },
}
