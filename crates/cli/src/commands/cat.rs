//! cat command - Write a file's contents to stdout

use clap::Args;

use unistore_core::Storage;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Write a file's contents to stdout
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Path in the backend
    pub path: String,
}

pub async fn execute(args: CatArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let stream = match storage.download(&args.path).await {
        Ok(stream) => stream,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let mut stdout = tokio::io::stdout();
    match stream.write_to(&mut stdout).await {
        Ok(_) => ExitCode::Success,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}
