//! rm command - Remove files

use clap::Args;

use unistore_core::Storage;

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Remove files
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Paths to remove
    #[arg(required = true)]
    pub paths: Vec<String>,
}

pub async fn execute(args: RmArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let result = match args.paths.as_slice() {
        [path] => storage.delete(path).await,
        paths => storage.batch_delete(paths).await,
    };
    report(
        result,
        formatter,
        &format!("removed {} file(s)", args.paths.len()),
    )
}
