//! Exit code definitions for the ust CLI

use unistore_core::Error;

/// Exit codes for the ust CLI application.
///
/// These codes follow a consistent convention to allow scripts and
/// automation to handle different error scenarios appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: invalid arguments, missing configuration, etc.
    UsageError = 2,

    /// Network or service-level error from an object store
    NetworkError = 3,

    /// Resource not found: file, object or directory does not exist
    NotFound = 5,

    /// Backend does not support this operation
    UnsupportedFeature = 7,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a storage error to the exit code it reports as
    pub const fn from_error(err: &Error) -> Self {
        match err {
            Error::Config(_) => Self::UsageError,
            Error::Remote(_) => Self::NetworkError,
            Error::NotFound(_) => Self::NotFound,
            Error::Unsupported(_) => Self::UnsupportedFeature,
            Error::Io(_) | Error::Parse(_) => Self::GeneralError,
        }
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or configuration",
            Self::NetworkError => "Storage service error",
            Self::NotFound => "Resource not found",
            Self::UnsupportedFeature => "Operation not supported by backend",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
