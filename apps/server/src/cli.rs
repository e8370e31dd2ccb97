//! # CLI Argument Definitions

use abr_logger::LevelFilter;
use clap::Parser;
use std::path::PathBuf;

/// Resolves and provisions the ABR server's startup settings.
#[derive(Debug, Parser)]
#[command(name = "abr-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve media, schema and backup locations for the ABR server")]
pub(crate) struct Cli {
    /// Installation base directory holding `abr_server.cfg`
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub(crate) base_dir: PathBuf,

    /// Read this config file instead of `<base-dir>/abr_server.cfg`
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Platform identifier to select the backup location for (defaults to the running one)
    #[arg(long, value_name = "ID")]
    pub(crate) platform: Option<String>,

    /// Minimum log level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub(crate) log_level: LevelFilter,

    /// Also write rolling log files into this directory
    #[arg(long, value_name = "DIR")]
    pub(crate) log_dir: Option<PathBuf>,

    /// Print the resolved settings as JSON on stdout
    #[arg(long)]
    pub(crate) json: bool,
}
