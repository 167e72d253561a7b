//! mv command - Move a file

use clap::Args;

use unistore_core::Storage;

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Move a file
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source path
    pub src: String,

    /// Destination path
    pub dst: String,
}

pub async fn execute(args: MvArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let result = storage.mv(&args.src, &args.dst).await;
    report(
        result,
        formatter,
        &format!("moved {} to {}", args.src, args.dst),
    )
}
