//! Common file descriptor returned by every backend
//!
//! `name` is always the logical path relative to the configured base, never
//! the backend-native key. A fresh value is built on every call; nothing is
//! cached.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// MIME type reported when the backend has nothing better to say.
///
/// Content sniffing is out of scope; every backend defaults to this value.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Metadata for a file or emulated directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Logical path relative to the configured base
    pub name: String,

    /// Size in bytes (zero for directories)
    pub size: i64,

    /// Last modification time, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<Timestamp>,

    /// Whether this entry is a directory (real or emulated)
    pub is_dir: bool,

    /// MIME type; defaults to [`DEFAULT_MIME_TYPE`]
    pub mime_type: String,
}

impl FileMetadata {
    /// Create metadata for a regular file
    pub fn file(name: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            size,
            mod_time: None,
            is_dir: false,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }

    /// Create metadata for a directory entry
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mod_time: None,
            is_dir: true,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }

    /// Set the modification time, builder-style
    pub fn with_mod_time(mut self, mod_time: Timestamp) -> Self {
        self.mod_time = Some(mod_time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata() {
        let meta = FileMetadata::file("a/b.txt", 5);
        assert_eq!(meta.name, "a/b.txt");
        assert_eq!(meta.size, 5);
        assert!(!meta.is_dir);
        assert!(meta.mod_time.is_none());
        assert_eq!(meta.mime_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_dir_metadata() {
        let meta = FileMetadata::dir("a");
        assert!(meta.is_dir);
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn test_mod_time_skipped_when_absent() {
        let json = serde_json::to_string(&FileMetadata::file("f", 1)).unwrap();
        assert!(!json.contains("mod_time"));

        let meta = FileMetadata::file("f", 1).with_mod_time(Timestamp::UNIX_EPOCH);
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("mod_time"));
    }
}
