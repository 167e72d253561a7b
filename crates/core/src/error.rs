//! Error types for unistore-core
//!
//! One error enum shared by every backend; the CLI maps variants to exit
//! codes.

use thiserror::Error;

/// Result type alias for unistore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing file, object or directory on read, delete or stat
    #[error("not found: {0}")]
    NotFound(String),

    /// Local filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Network or service-level failure from an object store
    #[error("remote error: {0}")]
    Remote(String),

    /// Malformed metadata header
    #[error("metadata parse error: {0}")]
    Parse(String),

    /// Operation the backend cannot express
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Missing or invalid configuration field at selection time
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Map a local IO error, turning `ErrorKind::NotFound` into the
    /// path-carrying `NotFound` variant.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_string())
        } else {
            Error::Io(err)
        }
    }

    /// Whether this error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from_io("a/b.txt", err);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: a/b.txt");
    }

    #[test]
    fn test_from_io_other() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from_io("a/b.txt", err);
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("io error:"));
    }
}
