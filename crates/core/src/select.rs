//! Backend selection
//!
//! A [`Registry`] is an explicit map from storage mode to an async
//! constructor. Callers build one, register the drivers they link against,
//! and pass it wherever selection happens; there is no ambient global
//! driver table and no teardown.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::config::{BackendConfig, StorageConfig, StorageMode};
use crate::error::{Error, Result};
use crate::traits::Storage;

/// Boxed async backend constructor
pub type Constructor =
    Box<dyn Fn(BackendConfig) -> BoxFuture<'static, Result<Box<dyn Storage>>> + Send + Sync>;

/// Explicit driver map: mode tag to constructor
#[derive(Default)]
pub struct Registry {
    drivers: HashMap<StorageMode, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `mode`, replacing any previous one
    pub fn register<F, Fut>(&mut self, mode: StorageMode, constructor: F)
    where
        F: Fn(BackendConfig) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Box<dyn Storage>>> + Send + 'static,
    {
        self.drivers
            .insert(mode, Box::new(move |config| Box::pin(constructor(config))));
    }

    /// Whether a driver is registered for `mode`
    pub fn contains(&self, mode: StorageMode) -> bool {
        self.drivers.contains_key(&mode)
    }

    /// Resolve the configuration, validate it and construct the selected
    /// backend.
    ///
    /// Returns the backend together with its base directory. Every refusal
    /// (unresolvable mode, missing required field, unregistered driver) is
    /// an [`Error::Config`] the caller must check; no backend instance is
    /// handed out on failure.
    pub async fn open(&self, config: &StorageConfig) -> Result<(String, Box<dyn Storage>)> {
        let (mode, backend_config) = config.resolve()?;

        let constructor = self.drivers.get(&mode).ok_or_else(|| {
            Error::Config(format!("no storage driver registered for mode '{mode}'"))
        })?;

        let base_dir = backend_config.base_dir().to_string();
        let storage = constructor(backend_config).await?;
        tracing::info!(%mode, %base_dir, "storage backend selected");
        Ok((base_dir, storage))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modes", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalConfig;
    use crate::local::LocalStorage;

    fn local_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(StorageMode::Local, |config| async move {
            match config {
                BackendConfig::Local(local) => {
                    Ok(Box::new(LocalStorage::new(local)) as Box<dyn Storage>)
                }
                other => Err(Error::Config(format!(
                    "local driver handed {other:?} configuration"
                ))),
            }
        });
        registry
    }

    #[tokio::test]
    async fn test_open_constructs_selected_backend() {
        let registry = local_registry();
        let config = StorageConfig {
            mode: Some(StorageMode::Local),
            local: LocalConfig {
                base_path: std::env::temp_dir().to_string_lossy().into_owned(),
            },
            ..Default::default()
        };
        let (base_dir, _storage) = registry.open(&config).await.unwrap();
        assert_eq!(base_dir, std::env::temp_dir().to_string_lossy().as_ref());
    }

    #[tokio::test]
    async fn test_open_defaults_to_local_temp_dir() {
        let registry = local_registry();
        let (base_dir, _storage) = registry.open(&StorageConfig::default()).await.unwrap();
        assert!(!base_dir.is_empty());
    }

    #[tokio::test]
    async fn test_open_refuses_unregistered_mode() {
        let registry = local_registry();
        let config = StorageConfig {
            mode: Some(StorageMode::Minio),
            minio: crate::config::MinioConfig {
                endpoint: "localhost:9000".into(),
                access_key_id: "ak".into(),
                access_key_secret: "sk".into(),
                use_ssl: false,
                bucket: "b".into(),
                base_dir: "app".into(),
            },
            ..Default::default()
        };
        let err = registry.open(&config).await.unwrap_err();
        assert!(err.to_string().contains("no storage driver"));
    }

    #[tokio::test]
    async fn test_open_refuses_invalid_config_before_construction() {
        let registry = local_registry();
        let config = StorageConfig {
            mode: Some(StorageMode::Local),
            ..Default::default()
        };
        assert!(matches!(
            registry.open(&config).await.unwrap_err(),
            Error::Config(_)
        ));
    }
}
