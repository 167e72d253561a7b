//! rmdir command - Remove a directory subtree

use clap::Args;

use unistore_core::Storage;

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Remove a directory subtree
#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Directory path to remove
    pub path: String,
}

pub async fn execute(args: RmdirArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let result = storage.delete_dir(&args.path).await;
    report(result, formatter, &format!("removed {}", args.path))
}
