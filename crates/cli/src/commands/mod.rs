//! CLI command definitions and execution
//!
//! The top-level parser resolves configuration and opens the selected
//! backend once; each subcommand then works against the `Storage` trait and
//! reports through the shared formatter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use unistore_core::StorageMode;

use crate::backend;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::settings;

mod cat;
mod cp;
mod download;
mod ls;
mod mkdir;
mod mv;
mod rm;
mod rmdir;
mod stat;
mod touch;
mod upload;

/// ust - unified storage CLI
///
/// One set of file operations over a local filesystem, a MinIO bucket or an
/// OSS bucket, selected by configuration.
#[derive(Parser, Debug)]
#[command(name = "ust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, env = "UST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage mode override: local, oss or minio
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Base path override for the local backend
    #[arg(long, global = true)]
    pub base_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload local files
    Upload(upload::UploadArgs),

    /// Download a file to a local path
    Download(download::DownloadArgs),

    /// Write a file's contents to stdout
    Cat(cat::CatArgs),

    /// Remove files
    Rm(rm::RmArgs),

    /// Move a file
    Mv(mv::MvArgs),

    /// Copy a file
    Cp(cp::CpArgs),

    /// Create a directory
    Mkdir(mkdir::MkdirArgs),

    /// Remove a directory subtree
    Rmdir(rmdir::RmdirArgs),

    /// List a directory recursively
    Ls(ls::LsArgs),

    /// Show file metadata
    Stat(stat::StatArgs),

    /// Set a file's modification time
    Touch(touch::TouchArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(OutputConfig {
        json: cli.json,
        quiet: cli.quiet,
    });

    let mode = match cli.mode.as_deref().map(|s| s.parse::<StorageMode>()).transpose() {
        Ok(mode) => mode,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let config = match settings::load(cli.config.as_deref(), mode, cli.base_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let (_base_dir, storage) = match backend::open(&config).await {
        Ok(opened) => opened,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    let storage = storage.as_ref();

    match cli.command {
        Commands::Upload(args) => upload::execute(args, storage, &formatter).await,
        Commands::Download(args) => download::execute(args, storage, &formatter).await,
        Commands::Cat(args) => cat::execute(args, storage, &formatter).await,
        Commands::Rm(args) => rm::execute(args, storage, &formatter).await,
        Commands::Mv(args) => mv::execute(args, storage, &formatter).await,
        Commands::Cp(args) => cp::execute(args, storage, &formatter).await,
        Commands::Mkdir(args) => mkdir::execute(args, storage, &formatter).await,
        Commands::Rmdir(args) => rmdir::execute(args, storage, &formatter).await,
        Commands::Ls(args) => ls::execute(args, storage, &formatter).await,
        Commands::Stat(args) => stat::execute(args, storage, &formatter).await,
        Commands::Touch(args) => touch::execute(args, storage, &formatter).await,
    }
}

/// Report a unit result with the shared success/error convention
pub(crate) fn report(
    result: unistore_core::Result<()>,
    formatter: &Formatter,
    success: &str,
) -> ExitCode {
    match result {
        Ok(()) => {
            formatter.success(success);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}
