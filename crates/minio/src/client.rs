//! MinIO client implementation
//!
//! Wraps aws-sdk-s3 and implements the Storage trait from unistore-core.
//! MinIO has no native directories: directory operations work on zero-length
//! placeholder objects and key prefixes, and rename is copy-then-delete.

use std::collections::VecDeque;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use jiff::Timestamp;
use tracing::{debug, info};

use unistore_core::metadata::FileMetadata;
use unistore_core::path::{SEPARATOR, ensure_dir_key, is_placeholder, join_key, logical_name};
use unistore_core::{ByteStream, Error, MinioConfig, Result, Storage};

/// Largest page a listing call returns; a shorter page ends the scan
const PAGE_SIZE: i32 = 1000;

/// Part size for multipart uploads; also the buffering bound per upload.
/// The service requires at least 5 MiB per part (except the last).
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Re-chunks a byte source into parts of up to a fixed size.
///
/// At most one part is held in memory, so an upload never buffers more
/// than `part_size` bytes regardless of object size.
struct PartReader {
    source: ByteStream,
    part_size: usize,
    buf: BytesMut,
    done: bool,
}

impl PartReader {
    fn new(source: ByteStream, part_size: usize) -> Self {
        Self {
            source,
            part_size,
            buf: BytesMut::new(),
            done: false,
        }
    }

    /// Next part of up to `part_size` bytes; `None` once the source is
    /// drained.
    async fn next_part(&mut self) -> Result<Option<Bytes>> {
        while !self.done && self.buf.len() < self.part_size {
            match self.source.next().await {
                Some(chunk) => self.buf.extend_from_slice(&chunk?),
                None => self.done = true,
            }
        }

        if self.buf.len() >= self.part_size {
            return Ok(Some(self.buf.split_to(self.part_size).freeze()));
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.buf.split().freeze()))
    }
}

/// MinIO storage backend
pub struct MinioStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    base_dir: String,
}

struct ScannedObject {
    key: String,
    size: i64,
    mod_time: Option<Timestamp>,
}

fn range_header(offset: u64, size: u64) -> String {
    format!("bytes={}-{}", offset, offset + size - 1)
}

/// Encode a copy source as `bucket/key` with each key segment URL-encoded
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded = key
        .split(SEPARATOR)
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded}")
}

fn map_sdk_error(path: &str, err: impl std::fmt::Display) -> Error {
    let err_str = err.to_string();
    if err_str.contains("NotFound") || err_str.contains("NoSuchKey") {
        Error::NotFound(path.to_string())
    } else {
        Error::Remote(err_str)
    }
}

impl MinioStorage {
    /// Connect to a MinIO endpoint, creating the configured bucket when it
    /// does not exist yet.
    pub async fn connect(config: MinioConfig) -> Result<Self> {
        let scheme = if config.use_ssl { "https" } else { "http" };
        let endpoint_url = format!("{scheme}://{}", config.endpoint);

        let credentials = aws_credential_types::Credentials::new(
            config.access_key_id.clone(),
            config.access_key_secret.clone(),
            None,
            None,
            "unistore-static-credentials",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new("us-east-1"))
            .endpoint_url(&endpoint_url)
            .load()
            .await;

        // MinIO wants path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);

        let storage = Self {
            client,
            bucket: config.bucket,
            base_dir: config.base_dir,
        };
        storage.ensure_bucket().await?;
        info!(endpoint = %endpoint_url, bucket = %storage.bucket, "minio backend connected");
        Ok(storage)
    }

    async fn ensure_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("NotFound") || err_str.contains("NoSuchBucket") {
                    info!(bucket = %self.bucket, "creating missing bucket");
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| Error::Remote(e.to_string()))?;
                    Ok(())
                } else {
                    Err(Error::Remote(err_str))
                }
            }
        }
    }

    fn native_key(&self, path: &str) -> String {
        join_key(&self.base_dir, path)
    }

    fn dir_prefix(&self, dir_path: &str) -> String {
        ensure_dir_key(&self.native_key(dir_path))
    }

    /// Collect every object under `prefix` across listing pages.
    ///
    /// A page shorter than the page size ends the scan; otherwise the
    /// continuation token is carried into the next request.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<ScannedObject>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .max_keys(PAGE_SIZE);
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }
            let response = request
                .send()
                .await
                .map_err(|e| Error::Remote(e.to_string()))?;

            let page = response.contents();
            let page_len = page.len();
            for object in page {
                let Some(key) = object.key() else { continue };
                if !key.starts_with(prefix) {
                    continue;
                }
                objects.push(ScannedObject {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0),
                    mod_time: object
                        .last_modified()
                        .and_then(|t| Timestamp::from_second(t.secs()).ok()),
                });
            }

            if page_len < PAGE_SIZE as usize {
                break;
            }
            match response.next_continuation_token() {
                Some(t) => token = Some(t.to_string()),
                None => break,
            }
        }

        Ok(objects)
    }

    /// Upload a body that fits in one sized put
    async fn put_whole(&self, key: &str, data: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(())
    }

    /// Drive a multipart upload for a source that exceeds one part.
    ///
    /// Parts are uploaded as they are drained from the reader; on failure
    /// the upload is aborted so no orphaned parts accumulate.
    async fn put_multipart(
        &self,
        key: &str,
        mut pending: VecDeque<Bytes>,
        mut parts: PartReader,
    ) -> Result<()> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| Error::Remote("multipart upload created without an id".to_string()))?
            .to_string();

        let mut completed = Vec::new();
        let mut part_number = 1i32;
        let result = loop {
            let part = match pending.pop_front() {
                Some(part) => Some(part),
                None => match parts.next_part().await {
                    Ok(part) => part,
                    Err(err) => break Err(err),
                },
            };
            let Some(part) = part else {
                break Ok(());
            };

            let response = match self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .part_number(part_number)
                .body(SdkByteStream::from(part))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => break Err(Error::Remote(e.to_string())),
            };

            completed.push(
                CompletedPart::builder()
                    .set_e_tag(response.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;
        };

        if let Err(err) = result {
            // Best effort; the error that aborted the upload wins.
            let _ = self
                .client
                .abort_multipart_upload()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await;
            return Err(err);
        }

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(())
    }

    async fn copy_object(&self, src_key: &str, dst_key: &str, src_path: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source(&self.bucket, src_key))
            .key(dst_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(src_path, e))?;
        Ok(())
    }
}

#[async_trait]
impl Storage for MinioStorage {
    async fn upload(&self, path: &str, source: ByteStream) -> Result<()> {
        info!(%path, "minio upload start");
        let key = self.native_key(path);

        // A source within one part goes up as a single sized put; anything
        // larger streams through a multipart upload, one part in memory at
        // a time.
        let mut parts = PartReader::new(source, PART_SIZE);
        let first = parts.next_part().await?;
        match first {
            None => self.put_whole(&key, Bytes::new()).await?,
            Some(first) => match parts.next_part().await? {
                None => self.put_whole(&key, first).await?,
                Some(second) => {
                    self.put_multipart(&key, VecDeque::from([first, second]), parts)
                        .await?
                }
            },
        }

        info!(%path, "minio upload done");
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<ByteStream> {
        info!(%path, "minio download start");
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.native_key(path))
            .send()
            .await
            .map_err(|e| map_sdk_error(path, e))?;

        Ok(ByteStream::from_reader(response.body.into_async_read()))
    }

    async fn download_range(&self, path: &str, offset: u64, size: u64) -> Result<ByteStream> {
        info!(%path, offset, size, "minio ranged download start");
        if size == 0 {
            return Ok(ByteStream::from_bytes(bytes::Bytes::new()));
        }

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.native_key(path))
            .range(range_header(offset, size))
            .send()
            .await
            .map_err(|e| map_sdk_error(path, e))?;

        Ok(ByteStream::from_reader(response.body.into_async_read()))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        info!(%path, "minio delete");
        // The service treats deleting an absent key as success.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.native_key(path))
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        info!(%old_path, %new_path, "minio rename start");
        let old_key = self.native_key(old_path);
        let new_key = self.native_key(new_path);

        // Copy then delete; a failure in between leaves both keys present.
        self.copy_object(&old_key, &new_key, old_path).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&old_key)
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        info!(%old_path, %new_path, "minio rename done");
        Ok(())
    }

    async fn copy(&self, src_path: &str, dst_path: &str) -> Result<()> {
        info!(%src_path, %dst_path, "minio copy");
        let src_key = self.native_key(src_path);
        let dst_key = self.native_key(dst_path);
        self.copy_object(&src_key, &dst_key, src_path).await
    }

    async fn create_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "minio create dir");
        let key = self.dir_prefix(dir_path);

        // Idempotent: only write the placeholder when it is absent.
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => {
                let err_str = e.to_string();
                if !err_str.contains("NotFound") && !err_str.contains("NoSuchKey") {
                    return Err(Error::Remote(err_str));
                }
            }
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(SdkByteStream::from_static(b""))
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(())
    }

    async fn delete_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "minio delete dir start");
        let prefix = self.dir_prefix(dir_path);

        let objects = self.scan_prefix(&prefix).await?;
        let mut deleted = 0usize;
        for object in &objects {
            if is_placeholder(&object.key, &prefix) {
                continue;
            }
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&object.key)
                .send()
                .await
                .map_err(|e| Error::Remote(e.to_string()))?;
            deleted += 1;
        }

        info!(%dir_path, deleted, "minio delete dir done");
        Ok(())
    }

    async fn list_dir(&self, dir_path: &str) -> Result<Vec<FileMetadata>> {
        info!(%dir_path, "minio list dir");
        let prefix = self.dir_prefix(dir_path);

        let mut entries = Vec::new();
        for object in self.scan_prefix(&prefix).await? {
            if is_placeholder(&object.key, &prefix) {
                continue;
            }
            let name = logical_name(&object.key, &self.base_dir);
            let mut item = if object.key.ends_with(SEPARATOR) {
                FileMetadata::dir(name.trim_end_matches(SEPARATOR))
            } else {
                FileMetadata::file(name, object.size)
            };
            item.mod_time = object.mod_time;
            entries.push(item);
        }

        debug!(%dir_path, count = entries.len(), "minio list dir done");
        Ok(entries)
    }

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata> {
        debug!(%path, "minio stat");
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.native_key(path))
            .send()
            .await
            .map_err(|e| map_sdk_error(path, e))?;

        let mut item = FileMetadata::file(path, response.content_length().unwrap_or(0));
        item.mod_time = response
            .last_modified()
            .and_then(|t| Timestamp::from_second(t.secs()).ok());
        if let Some(content_type) = response.content_type() {
            item.mime_type = content_type.to_string();
        }
        Ok(item)
    }

    async fn update_metadata(&self, path: &str, _metadata: &FileMetadata) -> Result<()> {
        Err(Error::Unsupported(format!(
            "metadata update is not supported on minio (path '{path}')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_header() {
        assert_eq!(range_header(0, 10), "bytes=0-9");
        assert_eq!(range_header(2, 5), "bytes=2-6");
    }

    #[test]
    fn test_copy_source_encoding() {
        assert_eq!(copy_source("bucket", "app/a/b.txt"), "bucket/app/a/b.txt");
        assert_eq!(
            copy_source("bucket", "app/with space.txt"),
            "bucket/app/with%20space.txt"
        );
    }

    async fn parts_of(chunks: Vec<&'static [u8]>, part_size: usize) -> Vec<Bytes> {
        let stream = futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))));
        let mut reader = PartReader::new(ByteStream::from_stream(stream), part_size);
        let mut parts = Vec::new();
        while let Some(part) = reader.next_part().await.unwrap() {
            parts.push(part);
        }
        parts
    }

    #[tokio::test]
    async fn test_part_reader_rechunks_across_boundaries() {
        let parts = parts_of(vec![b"abc", b"def", b"ghi"], 4).await;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_ref(), b"abcd");
        assert_eq!(parts[1].as_ref(), b"efgh");
        assert_eq!(parts[2].as_ref(), b"i");
    }

    #[tokio::test]
    async fn test_part_reader_never_exceeds_part_size() {
        let parts = parts_of(vec![b"0123456789", b"0123456789"], 4).await;
        assert!(parts.iter().all(|p| p.len() <= 4));
        let total: usize = parts.iter().map(|p| p.len()).sum();
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn test_part_reader_exact_multiple() {
        let parts = parts_of(vec![b"abcd", b"efgh"], 4).await;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].as_ref(), b"efgh");
    }

    #[tokio::test]
    async fn test_part_reader_empty_source() {
        let parts = parts_of(vec![], 4).await;
        assert!(parts.is_empty());
    }

    #[tokio::test]
    async fn test_part_reader_propagates_source_error() {
        let stream = futures::stream::iter([
            Ok(Bytes::from_static(b"ok")),
            Err(Error::Remote("connection reset".into())),
        ]);
        let mut reader = PartReader::new(ByteStream::from_stream(stream), 1024);
        assert!(matches!(reader.next_part().await, Err(Error::Remote(_))));
    }

    #[test]
    fn test_sdk_error_mapping() {
        let err = map_sdk_error("a.txt", "service error: NoSuchKey");
        assert!(err.is_not_found());
        let err = map_sdk_error("a.txt", "dispatch failure: timeout");
        assert!(matches!(err, Error::Remote(_)));
    }
}
