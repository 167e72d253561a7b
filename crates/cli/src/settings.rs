//! CLI configuration loading
//!
//! Reads the storage configuration from a TOML file: an explicit `--config`
//! path, or `<config dir>/ust/config.toml` when one exists. Command-line
//! overrides are applied on top, and mode resolution itself stays in
//! unistore-core.

use std::path::{Path, PathBuf};

use unistore_core::{Error, Result, StorageConfig, StorageMode};

/// Default configuration file, relative to the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ust").join("config.toml"))
}

/// Load the storage configuration and apply CLI overrides.
///
/// An explicit path that cannot be read is an error; an absent default path
/// falls back to the built-in configuration.
pub fn load(
    explicit: Option<&Path>,
    mode: Option<StorageMode>,
    base_path: Option<&str>,
) -> Result<StorageConfig> {
    let mut config = match explicit {
        Some(path) => read_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => StorageConfig::default(),
        },
    };

    if let Some(mode) = mode {
        config.assign_mode = Some(mode);
    }
    if let Some(base_path) = base_path {
        config.local.base_path = base_path.to_string();
    }
    Ok(config)
}

fn read_file(path: &Path) -> Result<StorageConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read config file '{}': {e}", path.display())))?;
    toml::from_str(&text)
        .map_err(|e| Error::Config(format!("invalid config file '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "mode = \"local\"\n\n[local]\nbase_path = \"/var/data\"\n"
        )
        .unwrap();

        let config = load(Some(file.path()), None, None).unwrap();
        assert_eq!(config.mode, Some(StorageMode::Local));
        assert_eq!(config.local.base_path, "/var/data");
    }

    #[test]
    fn test_load_missing_explicit_file_is_config_error() {
        let err = load(Some(Path::new("/nonexistent/ust.toml")), None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "mode = [broken").unwrap();
        let err = load(Some(file.path()), None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "mode = \"minio\"\n\n[minio]\nendpoint = \"localhost:9000\"\naccess_key_id = \"ak\"\naccess_key_secret = \"sk\"\nbucket = \"b\"\nbase_dir = \"app\"\n"
        )
        .unwrap();

        let config = load(Some(file.path()), Some(StorageMode::Local), Some("/tmp/override")).unwrap();
        assert_eq!(config.assign_mode, Some(StorageMode::Local));
        assert_eq!(config.local.base_path, "/tmp/override");

        let (mode, backend) = config.resolve().unwrap();
        assert_eq!(mode, StorageMode::Local);
        assert_eq!(backend.base_dir(), "/tmp/override");
    }
}
