//! touch command - Set a file's modification time
//!
//! Only meaningful on the local backend; flat stores report the operation
//! as unsupported.

use clap::Args;
use jiff::Timestamp;

use unistore_core::{Error, FileMetadata, Result, Storage};

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Set a file's modification time
#[derive(Args, Debug)]
pub struct TouchArgs {
    /// Path in the backend
    pub path: String,

    /// Modification time as RFC 3339; the current time when omitted
    #[arg(long)]
    pub time: Option<String>,
}

pub async fn execute(args: TouchArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let success = format!("touched {}", args.path);
    report(run(&args, storage).await, formatter, &success)
}

async fn run(args: &TouchArgs, storage: &dyn Storage) -> Result<()> {
    let mod_time = match &args.time {
        Some(raw) => raw
            .parse::<Timestamp>()
            .map_err(|e| Error::Parse(format!("invalid --time '{raw}': {e}")))?,
        None => Timestamp::now(),
    };

    let meta = FileMetadata::file(args.path.as_str(), 0).with_mod_time(mod_time);
    storage.update_metadata(&args.path, &meta).await
}
