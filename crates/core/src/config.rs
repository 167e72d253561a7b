//! Backend configuration model
//!
//! Serde structs loaded from TOML by the CLI (or built directly by library
//! callers). A configuration is immutable once a backend has been
//! constructed from it. Validation refuses empty required fields before any
//! client is built.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported storage substrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Hierarchical local filesystem
    Local,
    /// Aliyun-OSS-style flat object store
    Oss,
    /// MinIO flat object store
    Minio,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageMode::Local => "local",
            StorageMode::Oss => "oss",
            StorageMode::Minio => "minio",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for StorageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(StorageMode::Local),
            "oss" => Ok(StorageMode::Oss),
            "minio" => Ok(StorageMode::Minio),
            other => Err(Error::Config(format!(
                "unknown storage mode '{other}' (expected local, oss or minio)"
            ))),
        }
    }
}

/// Local filesystem backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Base path scoping all operations
    #[serde(default)]
    pub base_path: String,
}

/// OSS backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OssConfig {
    /// Service endpoint host, e.g. `oss-cn-hangzhou.aliyuncs.com`
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    /// Bucket name
    #[serde(default)]
    pub bucket: String,
    /// Key prefix scoping all operations
    #[serde(default)]
    pub base_dir: String,
}

/// MinIO backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinioConfig {
    /// Endpoint host and port, e.g. `localhost:9000`
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    /// Whether to speak TLS to the endpoint
    #[serde(default)]
    pub use_ssl: bool,
    /// Bucket name
    #[serde(default)]
    pub bucket: String,
    /// Key prefix scoping all operations
    #[serde(default)]
    pub base_dir: String,
}

/// Top-level configuration: mode selectors plus one section per backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Requested mode
    #[serde(default)]
    pub mode: Option<StorageMode>,

    /// Overriding mode; inherits `mode` when unset
    #[serde(default)]
    pub assign_mode: Option<StorageMode>,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub oss: OssConfig,

    #[serde(default)]
    pub minio: MinioConfig,
}

/// The configuration variant a single backend is constructed from
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Local(LocalConfig),
    Oss(OssConfig),
    Minio(MinioConfig),
}

impl BackendConfig {
    /// Validate that every required field for this variant is non-empty
    pub fn validate(&self) -> Result<()> {
        match self {
            BackendConfig::Local(cfg) => {
                require("local.base_path", &cfg.base_path)?;
            }
            BackendConfig::Oss(cfg) => {
                require("oss.endpoint", &cfg.endpoint)?;
                require("oss.access_key_id", &cfg.access_key_id)?;
                require("oss.access_key_secret", &cfg.access_key_secret)?;
                require("oss.bucket", &cfg.bucket)?;
                require("oss.base_dir", &cfg.base_dir)?;
            }
            BackendConfig::Minio(cfg) => {
                require("minio.endpoint", &cfg.endpoint)?;
                require("minio.access_key_id", &cfg.access_key_id)?;
                require("minio.access_key_secret", &cfg.access_key_secret)?;
                require("minio.bucket", &cfg.bucket)?;
                require("minio.base_dir", &cfg.base_dir)?;
            }
        }
        Ok(())
    }

    /// The base directory or path scoping this backend
    pub fn base_dir(&self) -> &str {
        match self {
            BackendConfig::Local(cfg) => &cfg.base_path,
            BackendConfig::Oss(cfg) => &cfg.base_dir,
            BackendConfig::Minio(cfg) => &cfg.base_dir,
        }
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::Config(format!("missing required field '{field}'")))
    } else {
        Ok(())
    }
}

impl StorageConfig {
    /// Resolve the effective mode and its validated backend configuration.
    ///
    /// An unset `assign_mode` inherits `mode`; when both are unset the
    /// local backend pointed at the process temporary directory is
    /// substituted.
    pub fn resolve(&self) -> Result<(StorageMode, BackendConfig)> {
        let mode = match (self.assign_mode, self.mode) {
            (Some(assigned), _) => assigned,
            (None, Some(mode)) => mode,
            (None, None) => {
                let local = LocalConfig {
                    base_path: std::env::temp_dir().to_string_lossy().into_owned(),
                };
                tracing::debug!(base_path = %local.base_path, "no mode configured, defaulting to local");
                return Ok((StorageMode::Local, BackendConfig::Local(local)));
            }
        };

        let config = match mode {
            StorageMode::Local => BackendConfig::Local(self.local.clone()),
            StorageMode::Oss => BackendConfig::Oss(self.oss.clone()),
            StorageMode::Minio => BackendConfig::Minio(self.minio.clone()),
        };
        config.validate()?;
        Ok((mode, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minio_section() -> MinioConfig {
        MinioConfig {
            endpoint: "localhost:9000".into(),
            access_key_id: "minioadmin".into(),
            access_key_secret: "minioadmin".into(),
            use_ssl: false,
            bucket: "bucket".into(),
            base_dir: "app".into(),
        }
    }

    #[test]
    fn test_mode_round_trip() {
        for (s, mode) in [
            ("local", StorageMode::Local),
            ("oss", StorageMode::Oss),
            ("minio", StorageMode::Minio),
        ] {
            assert_eq!(s.parse::<StorageMode>().unwrap(), mode);
            assert_eq!(mode.to_string(), s);
        }
        assert!("s3".parse::<StorageMode>().is_err());
    }

    #[test]
    fn test_assign_mode_inherits_mode() {
        let config = StorageConfig {
            mode: Some(StorageMode::Minio),
            minio: minio_section(),
            ..Default::default()
        };
        let (mode, backend) = config.resolve().unwrap();
        assert_eq!(mode, StorageMode::Minio);
        assert!(matches!(backend, BackendConfig::Minio(_)));
    }

    #[test]
    fn test_assign_mode_overrides_mode() {
        let config = StorageConfig {
            mode: Some(StorageMode::Minio),
            assign_mode: Some(StorageMode::Local),
            local: LocalConfig {
                base_path: "/var/data".into(),
            },
            ..Default::default()
        };
        let (mode, backend) = config.resolve().unwrap();
        assert_eq!(mode, StorageMode::Local);
        assert_eq!(backend.base_dir(), "/var/data");
    }

    #[test]
    fn test_both_unset_defaults_to_temp_dir() {
        let (mode, backend) = StorageConfig::default().resolve().unwrap();
        assert_eq!(mode, StorageMode::Local);
        assert_eq!(
            backend.base_dir(),
            std::env::temp_dir().to_string_lossy().as_ref()
        );
    }

    #[test]
    fn test_missing_field_refused() {
        let mut section = minio_section();
        section.bucket.clear();
        let config = StorageConfig {
            mode: Some(StorageMode::Minio),
            minio: section,
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("minio.bucket"));
    }

    #[test]
    fn test_empty_local_base_path_refused() {
        let config = StorageConfig {
            mode: Some(StorageMode::Local),
            ..Default::default()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml = r#"
            mode = "oss"

            [oss]
            endpoint = "oss-cn-hangzhou.aliyuncs.com"
            access_key_id = "ak"
            access_key_secret = "sk"
            bucket = "b"
            base_dir = "app"
        "#;
        let config: StorageConfig = toml::from_str(toml).unwrap();
        let (mode, backend) = config.resolve().unwrap();
        assert_eq!(mode, StorageMode::Oss);
        assert_eq!(backend.base_dir(), "app");
    }
}
