//! mkdir command - Create a directory

use clap::Args;

use unistore_core::Storage;

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Create a directory
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory path to create
    pub path: String,
}

pub async fn execute(args: MkdirArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let result = storage.create_dir(&args.path).await;
    report(result, formatter, &format!("created {}", args.path))
}
