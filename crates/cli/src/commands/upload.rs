//! upload command - Write local files to the backend

use std::path::{Path, PathBuf};

use clap::Args;

use unistore_core::{ByteStream, Error, Result, Storage};

use crate::commands::report;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Upload local files
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local files to upload
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Destination path; treated as a directory when uploading several files
    pub dest: String,
}

pub async fn execute(args: UploadArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let count = args.sources.len();
    let success = format!("uploaded {count} file(s) to {}", args.dest);
    report(run(&args, storage).await, formatter, &success)
}

async fn run(args: &UploadArgs, storage: &dyn Storage) -> Result<()> {
    if let [source] = args.sources.as_slice() {
        let stream = open_source(source).await?;
        return storage.upload(&args.dest, stream).await;
    }

    let mut batch = Vec::with_capacity(args.sources.len());
    for path in &args.sources {
        let name = file_name(path)?;
        let dest = format!("{}/{name}", args.dest.trim_end_matches('/'));
        batch.push((dest, open_source(path).await?));
    }
    storage.batch_upload(batch).await
}

async fn open_source(path: &Path) -> Result<ByteStream> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::from_io(&path.to_string_lossy(), e))?;
    Ok(ByteStream::from_reader(file))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config(format!("'{}' has no file name", path.display())))
}
