//! ust - unified storage CLI
//!
//! One set of file operations over a local filesystem, a MinIO bucket or an
//! OSS bucket, selected by configuration.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use unistore_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
