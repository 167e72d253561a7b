//! Backend-agnostic storage contract.
//!
//! One trait, [`Storage`], implemented by every backend; shared metadata,
//! path translation and streaming types; and a [`Registry`] that selects a
//! backend from configuration. Remote drivers live in their own crates so
//! this one stays free of SDK dependencies.

pub mod config;
pub mod error;
pub mod local;
pub mod metadata;
pub mod path;
pub mod select;
pub mod stream;
pub mod traits;

pub use config::{BackendConfig, LocalConfig, MinioConfig, OssConfig, StorageConfig, StorageMode};
pub use error::{Error, Result};
pub use local::LocalStorage;
pub use metadata::{DEFAULT_MIME_TYPE, FileMetadata};
pub use select::Registry;
pub use stream::{BridgeSender, ByteStream};
pub use traits::Storage;
