//! cp command - Copy a file

use clap::Args;

use unistore_core::Storage;

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Copy a file
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path
    pub src: String,

    /// Destination path
    pub dst: String,
}

pub async fn execute(args: CpArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let result = storage.copy(&args.src, &args.dst).await;
    report(
        result,
        formatter,
        &format!("copied {} to {}", args.src, args.dst),
    )
}
