//! download command - Copy a file from the backend to a local path

use std::path::PathBuf;

use clap::Args;

use unistore_core::{Error, Result, Storage};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Download a file to a local path
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Source path in the backend
    pub path: String,

    /// Local destination file
    pub output: PathBuf,

    /// Byte offset to start from; requires --length
    #[arg(long)]
    pub offset: Option<u64>,

    /// Number of bytes to fetch
    #[arg(long)]
    pub length: Option<u64>,
}

pub async fn execute(args: DownloadArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    match run(&args, storage).await {
        Ok(written) => {
            formatter.success(&format!(
                "downloaded {} to {} ({written} bytes)",
                args.path,
                args.output.display()
            ));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

async fn run(args: &DownloadArgs, storage: &dyn Storage) -> Result<u64> {
    let stream = match (args.offset, args.length) {
        (None, None) => storage.download(&args.path).await?,
        (offset, Some(length)) => {
            storage
                .download_range(&args.path, offset.unwrap_or(0), length)
                .await?
        }
        (Some(_), None) => {
            return Err(Error::Config("--offset requires --length".to_string()));
        }
    };

    let mut file = tokio::fs::File::create(&args.output).await?;
    stream.write_to(&mut file).await
}
