//! Local filesystem backend
//!
//! Each contract operation maps 1:1 onto a filesystem primitive. This is
//! the only backend with a real rename, and therefore the only one where
//! rename is atomic. Downloads go through the streaming bridge so the
//! caller gets a lazy stream instead of the whole file in memory.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use jiff::Timestamp;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LocalConfig;
use crate::error::{Error, Result};
use crate::metadata::FileMetadata;
use crate::path::local_path;
use crate::stream::{BRIDGE_CAPACITY, ByteStream, CHUNK_SIZE};
use crate::traits::Storage;

/// Storage backend over a hierarchical file tree
#[derive(Debug)]
pub struct LocalStorage {
    config: LocalConfig,
}

impl LocalStorage {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    fn full_path(&self, path: &str) -> std::path::PathBuf {
        local_path(&self.config.base_path, path)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, path: &str, mut source: ByteStream) -> Result<()> {
        info!(%path, "local upload start");
        let full = self.full_path(path);

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Partial writes on failure are left behind; no rollback.
        let mut file = fs::File::create(&full).await?;
        while let Some(chunk) = source.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        info!(%path, "local upload done");
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<ByteStream> {
        info!(%path, "local download start");
        let full = self.full_path(path);

        let mut file = fs::File::open(&full)
            .await
            .map_err(|e| Error::from_io(path, e))?;

        let (tx, stream) = ByteStream::channel(BRIDGE_CAPACITY);
        tokio::spawn(async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match file.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if !tx.send(Bytes::copy_from_slice(&buf[..n])).await {
                            // Consumer went away; stop reading.
                            break;
                        }
                    }
                    Err(e) => {
                        tx.fail(Error::Io(e)).await;
                        break;
                    }
                }
            }
        });

        Ok(stream)
    }

    async fn download_range(&self, path: &str, offset: u64, size: u64) -> Result<ByteStream> {
        info!(%path, offset, size, "local ranged download start");
        let full = self.full_path(path);

        let mut file = fs::File::open(&full)
            .await
            .map_err(|e| Error::from_io(path, e))?;
        file.seek(SeekFrom::Start(offset)).await?;

        let (tx, stream) = ByteStream::channel(BRIDGE_CAPACITY);
        tokio::spawn(async move {
            let mut remaining = size;
            let mut buf = vec![0u8; CHUNK_SIZE];
            while remaining > 0 {
                let want = remaining.min(CHUNK_SIZE as u64) as usize;
                match file.read(&mut buf[..want]).await {
                    Ok(0) => break,
                    Ok(n) => {
                        remaining -= n as u64;
                        if !tx.send(Bytes::copy_from_slice(&buf[..n])).await {
                            break;
                        }
                    }
                    Err(e) => {
                        tx.fail(Error::Io(e)).await;
                        break;
                    }
                }
            }
        });

        Ok(stream)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        info!(%path, "local delete");
        fs::remove_file(self.full_path(path))
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        info!(%old_path, %new_path, "local rename");
        fs::rename(self.full_path(old_path), self.full_path(new_path))
            .await
            .map_err(|e| Error::from_io(old_path, e))
    }

    async fn copy(&self, src_path: &str, dst_path: &str) -> Result<()> {
        info!(%src_path, %dst_path, "local copy start");
        let mut src = fs::File::open(self.full_path(src_path))
            .await
            .map_err(|e| Error::from_io(src_path, e))?;
        let mut dst = fs::File::create(self.full_path(dst_path)).await?;

        // Not atomic; a failure mid-copy leaves a partial destination.
        tokio::io::copy(&mut src, &mut dst).await?;
        dst.flush().await?;

        info!(%src_path, %dst_path, "local copy done");
        Ok(())
    }

    async fn create_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "local create dir");
        fs::create_dir_all(self.full_path(dir_path)).await?;
        Ok(())
    }

    async fn delete_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "local delete dir");
        fs::remove_dir_all(self.full_path(dir_path))
            .await
            .map_err(|e| Error::from_io(dir_path, e))
    }

    async fn list_dir(&self, dir_path: &str) -> Result<Vec<FileMetadata>> {
        info!(%dir_path, "local list dir");
        let root = self.full_path(dir_path);
        let base = std::path::PathBuf::from(&self.config.base_path);

        let entries = tokio::task::spawn_blocking(move || -> Result<Vec<FileMetadata>> {
            if !root.exists() {
                // A deleted or never-created directory lists as empty.
                return Ok(Vec::new());
            }

            let mut entries = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1) {
                let entry = entry.map_err(|e| match e.into_io_error() {
                    Some(io) => Error::Io(io),
                    None => Error::Io(std::io::Error::other("walk cycle")),
                })?;
                let meta = entry.metadata().map_err(|e| match e.into_io_error() {
                    Some(io) => Error::Io(io),
                    None => Error::Io(std::io::Error::other("walk cycle")),
                })?;

                let name = entry
                    .path()
                    .strip_prefix(&base)
                    .unwrap_or(entry.path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                let mut item = if meta.is_dir() {
                    FileMetadata::dir(name)
                } else {
                    FileMetadata::file(name, meta.len() as i64)
                };
                item.mod_time = meta
                    .modified()
                    .ok()
                    .and_then(|st| Timestamp::try_from(st).ok());
                entries.push(item);
            }
            Ok(entries)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        debug!(%dir_path, count = entries.len(), "local list dir done");
        Ok(entries)
    }

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata> {
        debug!(%path, "local stat");
        let meta = fs::metadata(self.full_path(path))
            .await
            .map_err(|e| Error::from_io(path, e))?;

        let mut item = if meta.is_dir() {
            FileMetadata::dir(path)
        } else {
            FileMetadata::file(path, meta.len() as i64)
        };
        item.mod_time = meta
            .modified()
            .ok()
            .and_then(|st| Timestamp::try_from(st).ok());
        Ok(item)
    }

    async fn update_metadata(&self, path: &str, metadata: &FileMetadata) -> Result<()> {
        info!(%path, "local update metadata");

        // Only the modification time is settable, and only when one is
        // actually supplied; an unset time leaves the file untouched.
        let Some(mod_time) = metadata.mod_time else {
            return Ok(());
        };
        let system_time = std::time::SystemTime::try_from(mod_time)
            .map_err(|e| Error::Parse(format!("mod_time out of range: {e}")))?;

        let full = self.full_path(path);
        let logical = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = std::fs::OpenOptions::new()
                .write(true)
                .open(&full)
                .map_err(|e| Error::from_io(&logical, e))?;
            file.set_modified(system_time)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}
