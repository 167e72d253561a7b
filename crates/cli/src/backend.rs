//! Backend wiring
//!
//! Builds the driver registry linking all three backends and opens the one
//! the configuration selects.

use unistore_core::{BackendConfig, Error, Registry, Result, Storage, StorageConfig, StorageMode};
use unistore_minio::MinioStorage;
use unistore_oss::OssStorage;

/// Registry with every backend this binary links against
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register(StorageMode::Local, |config| async move {
        match config {
            BackendConfig::Local(local) => Ok(Box::new(unistore_core::LocalStorage::new(local))
                as Box<dyn Storage>),
            other => Err(Error::Config(format!(
                "local driver handed {other:?} configuration"
            ))),
        }
    });

    registry.register(StorageMode::Minio, |config| async move {
        match config {
            BackendConfig::Minio(minio) => Ok(Box::new(MinioStorage::connect(minio).await?)
                as Box<dyn Storage>),
            other => Err(Error::Config(format!(
                "minio driver handed {other:?} configuration"
            ))),
        }
    });

    registry.register(StorageMode::Oss, |config| async move {
        match config {
            BackendConfig::Oss(oss) => Ok(Box::new(OssStorage::connect(oss)?) as Box<dyn Storage>),
            other => Err(Error::Config(format!(
                "oss driver handed {other:?} configuration"
            ))),
        }
    });

    registry
}

/// Open the configured backend
pub async fn open(config: &StorageConfig) -> Result<(String, Box<dyn Storage>)> {
    default_registry().open(config).await
}
