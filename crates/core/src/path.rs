//! Key and path translation
//!
//! Turns a configured base directory plus a caller-supplied logical path into
//! a backend-native identifier. Pure string transforms: redundant separators
//! are collapsed, but `..` segments and symlinks are not resolved -- callers
//! are responsible for not crossing the base boundary.

use std::path::PathBuf;

/// Separator used for flat object-store keys
pub const SEPARATOR: char = '/';

/// Join a base directory and a logical path into a flat-store key.
///
/// Collapses duplicate separators and strips any leading separator. A
/// trailing separator on `path` is preserved so directory keys survive the
/// join; an empty base yields the normalized path alone.
pub fn join_key(base: &str, path: &str) -> String {
    let trailing = path.ends_with(SEPARATOR) && !path.trim_matches(SEPARATOR).is_empty();

    let mut key = String::new();
    for segment in base
        .split(SEPARATOR)
        .chain(path.split(SEPARATOR))
        .filter(|s| !s.is_empty())
    {
        if !key.is_empty() {
            key.push(SEPARATOR);
        }
        key.push_str(segment);
    }

    if trailing {
        key.push(SEPARATOR);
    }
    key
}

/// Append the separator when absent, for paths that denote a directory
pub fn ensure_dir_key(path: &str) -> String {
    if path.is_empty() || path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

/// Whether `key` is the directory placeholder for `prefix` itself.
///
/// Placeholder-identity keys are the prefix as-is or the prefix with a
/// single trailing separator; they are hidden from listings and skipped by
/// recursive deletes.
pub fn is_placeholder(key: &str, prefix: &str) -> bool {
    key == prefix || key == format!("{}{SEPARATOR}", prefix.trim_end_matches(SEPARATOR))
}

/// Strip the configured base from a native key, yielding the logical name.
///
/// Listing entries never contain the base-directory prefix; a key outside
/// the base is returned unchanged.
pub fn logical_name(key: &str, base: &str) -> String {
    if base.is_empty() {
        return key.trim_start_matches(SEPARATOR).to_string();
    }
    let base_key = ensure_dir_key(&join_key(base, ""));
    key.strip_prefix(&base_key).unwrap_or(key).to_string()
}

/// Resolve a logical path against a filesystem base path
pub fn local_path(base: &str, path: &str) -> PathBuf {
    let mut full = PathBuf::from(base);
    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        full.push(segment);
    }
    full
}
