//! ls command - List a directory recursively

use clap::Args;
use humansize::{BINARY, format_size};

use unistore_core::{FileMetadata, Storage};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// List a directory recursively
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory path; the backend root when omitted
    #[arg(default_value = "")]
    pub path: String,

    /// Long listing with size and modification time
    #[arg(short, long)]
    pub long: bool,
}

pub async fn execute(args: LsArgs, storage: &dyn Storage, formatter: &Formatter) -> ExitCode {
    let mut entries = match storage.list_dir(&args.path).await {
        Ok(entries) => entries,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if formatter.is_json() {
        formatter.json(&entries);
        return ExitCode::Success;
    }

    for entry in &entries {
        formatter.println(&render(entry, args.long));
    }
    ExitCode::Success
}

fn render(entry: &FileMetadata, long: bool) -> String {
    let name = if entry.is_dir {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    };

    if !long {
        return name;
    }

    let size = format_size(entry.size.max(0) as u64, BINARY);
    let time = entry
        .mod_time
        .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{size:>10}  {time}  {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_short() {
        assert_eq!(render(&FileMetadata::file("a/b.txt", 5), false), "a/b.txt");
        assert_eq!(render(&FileMetadata::dir("a/sub"), false), "a/sub/");
    }

    #[test]
    fn test_render_long() {
        let entry = FileMetadata::file("a/b.txt", 1024)
            .with_mod_time("2024-01-02T10:30:00Z".parse().unwrap());
        let line = render(&entry, true);
        assert!(line.contains("1 KiB"));
        assert!(line.contains("2024-01-02 10:30:00"));
        assert!(line.ends_with("a/b.txt"));
    }

    #[test]
    fn test_render_long_without_time() {
        let line = render(&FileMetadata::file("a", 1), true);
        assert!(line.contains('-'));
    }
}
