//! stat command - Show file metadata

use clap::Args;
use humansize::{BINARY, format_size};

use unistore_core::Storage;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Show file metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Path in the backend
    pub path: String,
}

pub async fn execute(args: StatArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let meta = match storage.get_metadata(&args.path).await {
        Ok(meta) => meta,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&meta);
        return ExitCode::Success;
    }

    formatter.println(&format!("Name : {}", meta.name));
    formatter.println(&format!(
        "Size : {} ({} bytes)",
        format_size(meta.size.max(0) as u64, BINARY),
        meta.size
    ));
    if let Some(mod_time) = meta.mod_time {
        formatter.println(&format!(
            "Date : {}",
            mod_time.strftime("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    formatter.println(&format!("Type : {}", meta.mime_type));
    if meta.is_dir {
        formatter.println("Kind : directory");
    }
    ExitCode::Success
}
