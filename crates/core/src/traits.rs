//! Storage trait definition
//!
//! One capability contract, three implementations selected at construction
//! time: the local filesystem backend in this crate and the two flat
//! object-store backends in their own crates. The trait objects share no
//! state beyond the contract.
//!
//! Cancellation is the caller dropping an operation future; in-flight
//! client calls then surface as stream read errors. Nothing here retries.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::metadata::FileMetadata;
use crate::stream::ByteStream;

/// The unified storage contract.
///
/// All paths are logical, relative to the backend's configured base. Single
/// instances hold no durable state of their own; everything lives in the
/// backing store, so no internal locking is needed.
///
/// Partial failures are not rolled back: `upload` and `copy` may leave
/// truncated output behind, and `rename` on flat stores is copy-then-delete
/// with an observable intermediate state.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a byte source to `path`, creating parents as needed
    async fn upload(&self, path: &str, source: ByteStream) -> Result<()>;

    /// Open `path` as a lazy byte stream
    async fn download(&self, path: &str) -> Result<ByteStream>;

    /// Open bytes `[offset, offset + size)` of `path` as a lazy byte stream
    async fn download_range(&self, path: &str, offset: u64, size: u64) -> Result<ByteStream>;

    /// Remove a single file or object
    async fn delete(&self, path: &str) -> Result<()>;

    /// Rename `old_path` to `new_path`.
    ///
    /// Atomic only on the filesystem backend; flat stores emulate it as
    /// copy-then-delete and a failure in between leaves both keys present.
    async fn rename(&self, old_path: &str, new_path: &str) -> Result<()>;

    /// Move a file; same semantics as [`Storage::rename`]
    async fn mv(&self, src_path: &str, dst_path: &str) -> Result<()> {
        self.rename(src_path, dst_path).await
    }

    /// Copy a file; not atomic on any backend
    async fn copy(&self, src_path: &str, dst_path: &str) -> Result<()>;

    /// Create a directory (recursively; emulated on flat stores); idempotent
    async fn create_dir(&self, dir_path: &str) -> Result<()>;

    /// Remove a directory subtree
    async fn delete_dir(&self, dir_path: &str) -> Result<()>;

    /// List every entry under `dir_path`, recursively, in one logical
    /// result; entry names are relative to the configured base
    async fn list_dir(&self, dir_path: &str) -> Result<Vec<FileMetadata>>;

    /// Stat a single file or object
    async fn get_metadata(&self, path: &str) -> Result<FileMetadata>;

    /// Update mutable metadata.
    ///
    /// The filesystem backend applies `mod_time` when it is set; flat
    /// stores cannot mutate metadata in place and always refuse.
    async fn update_metadata(&self, path: &str, metadata: &FileMetadata) -> Result<()>;

    /// Upload several files sequentially, in the given order, failing fast.
    ///
    /// On the first failure the remaining entries are left untouched and
    /// already-written entries are not rolled back.
    async fn batch_upload(&self, files: Vec<(String, ByteStream)>) -> Result<()> {
        let total = files.len();
        tracing::info!(total, "batch upload start");
        for (path, source) in files {
            if let Err(err) = self.upload(&path, source).await {
                tracing::error!(%path, %err, "batch upload aborted");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Open a download stream per path, sequentially, failing fast.
    ///
    /// On failure, streams already opened in this call are dropped (which
    /// stops their producers) before the error is returned, so no handle
    /// leaks.
    async fn batch_download(&self, paths: &[String]) -> Result<HashMap<String, ByteStream>> {
        let mut streams = HashMap::with_capacity(paths.len());
        for path in paths {
            match self.download(path).await {
                Ok(stream) => {
                    streams.insert(path.clone(), stream);
                }
                Err(err) => {
                    tracing::error!(%path, %err, "batch download aborted");
                    drop(streams);
                    return Err(err);
                }
            }
        }
        Ok(streams)
    }

    /// Delete several files sequentially, in the given order, failing fast
    async fn batch_delete(&self, paths: &[String]) -> Result<()> {
        let total = paths.len();
        tracing::info!(total, "batch delete start");
        for path in paths {
            if let Err(err) = self.delete(path).await {
                tracing::error!(%path, %err, "batch delete aborted");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for dyn Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Storage")
    }
}
