//! Output formatting utilities
//!
//! Human-readable and JSON output with a consistent shape across commands.
//! In JSON mode everything printed to stdout is strict JSON.

use serde::Serialize;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

/// Formatter for CLI output
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Print a human-readable line; suppressed in quiet and JSON modes
    pub fn println(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            println!("{message}");
        }
    }

    /// Print a success confirmation; in JSON mode the exit code carries it
    pub fn success(&self, message: &str) {
        if !self.config.quiet && !self.config.json {
            println!("{message}");
        }
    }

    /// Serialize a value to stdout as JSON
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error serializing output: {e}"),
        }
    }

    /// Print an error; always emitted, even in quiet mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("error: {message}");
        }
    }
}
