//! OSS client implementation
//!
//! Talks to the OSS REST API over reqwest with manual V4 signing and
//! implements the Storage trait from unistore-core. Downloads and uploads
//! stream through the HTTP body; only the signing metadata is buffered.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use jiff::Timestamp;
use tracing::{debug, info};

use unistore_core::metadata::FileMetadata;
use unistore_core::path::{SEPARATOR, ensure_dir_key, is_placeholder, join_key, logical_name};
use unistore_core::{ByteStream, Error, OssConfig, Result, Storage};

use crate::sign::{RequestSigner, UNSIGNED_PAYLOAD, empty_payload_hash};
use crate::xml::parse_list_page;

/// Largest page a listing call returns; a shorter page ends the scan
const PAGE_SIZE: usize = 1000;

/// OSS storage backend
pub struct OssStorage {
    client: reqwest::Client,
    bucket: String,
    base_dir: String,
    /// Virtual-hosted request host, `{bucket}.{endpoint}`
    host: String,
    /// `http` or `https`, taken from the configured endpoint
    scheme: String,
    signer: RequestSigner,
}

fn net(err: reqwest::Error) -> Error {
    Error::Remote(err.to_string())
}

/// URL-encode an object key, segment by segment, keeping the separators
fn encode_key(key: &str) -> String {
    key.split(SEPARATOR)
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a metadata time header: RFC 2822 first, then the plain
/// `%Y-%m-%d %H:%M:%S` rendering some gateways emit.
fn parse_http_time(s: &str) -> Result<Timestamp> {
    static PARSER: jiff::fmt::rfc2822::DateTimeParser = jiff::fmt::rfc2822::DateTimeParser::new();
    if let Ok(ts) = PARSER.parse_timestamp(s) {
        return Ok(ts);
    }

    let dt = jiff::civil::DateTime::strptime("%Y-%m-%d %H:%M:%S", s)
        .map_err(|_| Error::Parse(format!("unrecognized modification time '{s}'")))?;
    Ok(dt
        .to_zoned(jiff::tz::TimeZone::UTC)
        .map_err(|e| Error::Parse(e.to_string()))?
        .timestamp())
}

impl OssStorage {
    /// Build a client for the configured bucket. No network call is made
    /// here; the first operation will surface connectivity problems.
    pub fn connect(config: OssConfig) -> Result<Self> {
        // An explicit http:// endpoint (a local gateway, say) keeps its
        // scheme; anything else defaults to https.
        let (scheme, endpoint) = if let Some(rest) = config.endpoint.strip_prefix("http://") {
            ("http", rest)
        } else {
            ("https", config.endpoint.strip_prefix("https://").unwrap_or(&config.endpoint))
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(net)?;
        let signer = RequestSigner::new(&config.access_key_id, &config.access_key_secret, endpoint);

        info!(endpoint, bucket = %config.bucket, region = signer.region(), "oss backend ready");
        Ok(Self {
            client,
            host: format!("{}.{endpoint}", config.bucket),
            bucket: config.bucket,
            base_dir: config.base_dir,
            scheme: scheme.to_string(),
            signer,
        })
    }

    fn native_key(&self, path: &str) -> String {
        join_key(&self.base_dir, path)
    }

    fn dir_prefix(&self, dir_path: &str) -> String {
        ensure_dir_key(&self.native_key(dir_path))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.host, encode_key(key))
    }

    /// Sign a request and return the headers to send, authorization
    /// included. `resource` is the canonical URI, `/{bucket}/{key}`.
    fn authorize(
        &self,
        method: &str,
        resource: &str,
        query: &str,
        mut headers: BTreeMap<String, String>,
        payload_hash: &str,
    ) -> BTreeMap<String, String> {
        let now = Timestamp::now();
        let date_time = now.strftime("%Y%m%dT%H%M%SZ").to_string();
        let date = now.strftime("%Y%m%d").to_string();

        headers.insert("host".to_string(), self.host.clone());
        headers.insert("x-oss-content-sha256".to_string(), payload_hash.to_string());
        headers.insert("x-oss-date".to_string(), date_time.clone());

        let auth = self
            .signer
            .sign(method, resource, query, &headers, payload_hash, &date_time, &date);

        // reqwest sets the host header itself
        headers.remove("host");
        headers.insert("authorization".to_string(), auth);
        headers
    }

    fn authorize_object(
        &self,
        method: &str,
        key: &str,
        headers: BTreeMap<String, String>,
        payload_hash: &str,
    ) -> (String, BTreeMap<String, String>) {
        let resource = format!("/{}/{}", self.bucket, encode_key(key));
        let headers = self.authorize(method, &resource, "", headers, payload_hash);
        (self.object_url(key), headers)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        headers: BTreeMap<String, String>,
    ) -> Result<reqwest::Response> {
        let mut builder = builder;
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        builder.send().await.map_err(net)
    }

    /// Map a non-success response to an error, consuming the body for the
    /// message
    async fn check(op: &str, path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("oss {op} failed: HTTP {status} - {body}")));
        }
        Ok(response)
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        let (url, headers) = self.authorize_object("DELETE", key, BTreeMap::new(), &empty_payload_hash());
        let response = self.send(self.client.delete(&url), headers).await?;

        // Deleting an absent key counts as success
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check("delete", key, response).await?;
        Ok(())
    }

    async fn put_empty(&self, key: &str) -> Result<()> {
        let hash = empty_payload_hash();
        let (url, headers) = self.authorize_object("PUT", key, BTreeMap::new(), &hash);
        let response = self.send(self.client.put(&url), headers).await?;
        Self::check("put", key, response).await?;
        Ok(())
    }

    async fn copy_key(&self, src_key: &str, dst_key: &str, src_path: &str) -> Result<()> {
        let mut extra = BTreeMap::new();
        extra.insert(
            "x-oss-copy-source".to_string(),
            format!("/{}/{}", self.bucket, encode_key(src_key)),
        );
        let (url, headers) = self.authorize_object("PUT", dst_key, extra, &empty_payload_hash());
        let response = self.send(self.client.put(&url), headers).await?;
        Self::check("copy", src_path, response).await?;
        Ok(())
    }

    /// Collect every object under `prefix` across marker-paginated pages.
    ///
    /// A page shorter than the page size ends the scan; otherwise the next
    /// marker (or the last key, when the service omits one) is carried into
    /// the next request.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<crate::xml::ObjectSummary>> {
        let mut objects = Vec::new();
        let mut marker = String::new();

        loop {
            // Query parameters in canonical (sorted) order
            let mut query = String::new();
            if !marker.is_empty() {
                query.push_str(&format!("marker={}&", urlencoding::encode(&marker)));
            }
            query.push_str(&format!(
                "max-keys={PAGE_SIZE}&prefix={}",
                urlencoding::encode(prefix)
            ));

            let resource = format!("/{}/", self.bucket);
            let headers =
                self.authorize("GET", &resource, &query, BTreeMap::new(), &empty_payload_hash());
            let url = format!("{}://{}/?{query}", self.scheme, self.host);
            let response = self.send(self.client.get(&url), headers).await?;
            let response = Self::check("list", prefix, response).await?;

            let body = response.text().await.map_err(net)?;
            let page = parse_list_page(&body);
            let page_len = page.objects.len();

            let mut last_key = None;
            for object in page.objects {
                last_key = Some(object.key.clone());
                if object.key.starts_with(prefix) {
                    objects.push(object);
                }
            }

            if page_len < PAGE_SIZE {
                break;
            }
            match page.next_marker.or(last_key) {
                Some(next) => marker = next,
                None => break,
            }
        }

        Ok(objects)
    }
}

#[async_trait]
impl Storage for OssStorage {
    async fn upload(&self, path: &str, source: ByteStream) -> Result<()> {
        info!(%path, "oss upload start");
        let key = self.native_key(path);

        // Streaming body, so the payload stays unsigned
        let (url, headers) = self.authorize_object("PUT", &key, BTreeMap::new(), UNSIGNED_PAYLOAD);
        let builder = self.client.put(&url).body(reqwest::Body::wrap_stream(source));
        let response = self.send(builder, headers).await?;
        Self::check("put", path, response).await?;

        info!(%path, "oss upload done");
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<ByteStream> {
        info!(%path, "oss download start");
        let key = self.native_key(path);

        let (url, headers) = self.authorize_object("GET", &key, BTreeMap::new(), &empty_payload_hash());
        let response = self.send(self.client.get(&url), headers).await?;
        let response = Self::check("get", path, response).await?;

        let stream = response.bytes_stream().map(|chunk| chunk.map_err(net));
        Ok(ByteStream::from_stream(stream))
    }

    async fn download_range(&self, path: &str, offset: u64, size: u64) -> Result<ByteStream> {
        info!(%path, offset, size, "oss ranged download start");
        if size == 0 {
            return Ok(ByteStream::from_bytes(bytes::Bytes::new()));
        }
        let key = self.native_key(path);

        let mut extra = BTreeMap::new();
        extra.insert(
            "range".to_string(),
            format!("bytes={}-{}", offset, offset + size - 1),
        );
        let (url, headers) = self.authorize_object("GET", &key, extra, &empty_payload_hash());
        let response = self.send(self.client.get(&url), headers).await?;
        let response = Self::check("get", path, response).await?;

        let stream = response.bytes_stream().map(|chunk| chunk.map_err(net));
        Ok(ByteStream::from_stream(stream))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        info!(%path, "oss delete");
        self.delete_key(&self.native_key(path)).await
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        info!(%old_path, %new_path, "oss rename start");
        let old_key = self.native_key(old_path);
        let new_key = self.native_key(new_path);

        // Copy then delete; a failure in between leaves both keys present.
        self.copy_key(&old_key, &new_key, old_path).await?;
        self.delete_key(&old_key).await?;

        info!(%old_path, %new_path, "oss rename done");
        Ok(())
    }

    async fn copy(&self, src_path: &str, dst_path: &str) -> Result<()> {
        info!(%src_path, %dst_path, "oss copy");
        let src_key = self.native_key(src_path);
        let dst_key = self.native_key(dst_path);
        self.copy_key(&src_key, &dst_key, src_path).await
    }

    async fn create_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "oss create dir");
        let key = self.dir_prefix(dir_path);

        // Idempotent: only write the placeholder when it is absent.
        let (url, headers) = self.authorize_object("HEAD", &key, BTreeMap::new(), &empty_payload_hash());
        let response = self.send(self.client.head(&url), headers).await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Remote(format!(
                "oss head failed: HTTP {}",
                response.status()
            )));
        }

        self.put_empty(&key).await
    }

    async fn delete_dir(&self, dir_path: &str) -> Result<()> {
        info!(%dir_path, "oss delete dir start");
        let prefix = self.dir_prefix(dir_path);

        let objects = self.scan_prefix(&prefix).await?;
        let mut deleted = 0usize;
        for object in &objects {
            if is_placeholder(&object.key, &prefix) {
                continue;
            }
            self.delete_key(&object.key).await?;
            deleted += 1;
        }

        info!(%dir_path, deleted, "oss delete dir done");
        Ok(())
    }

    async fn list_dir(&self, dir_path: &str) -> Result<Vec<FileMetadata>> {
        info!(%dir_path, "oss list dir");
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
            item.mod_time = object.last_modified;
            entries.push(item);
        }

        debug!(%dir_path, count = entries.len(), "oss list dir done");
        Ok(entries)
    }

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata> {
        debug!(%path, "oss stat");
        let key = self.native_key(path);

        let (url, headers) = self.authorize_object("HEAD", &key, BTreeMap::new(), &empty_payload_hash());
        let response = self.send(self.client.head(&url), headers).await?;
        let response = Self::check("head", path, response).await?;

        let size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let mut item = FileMetadata::file(path, size);
        if let Some(value) = response.headers().get(reqwest::header::LAST_MODIFIED) {
            let raw = value
                .to_str()
                .map_err(|_| Error::Parse("non-text last-modified header".to_string()))?;
            item.mod_time = Some(parse_http_time(raw)?);
        }
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            item.mime_type = content_type.to_string();
        }
        Ok(item)
    }

    async fn update_metadata(&self, path: &str, _metadata: &FileMetadata) -> Result<()> {
        Err(Error::Unsupported(format!(
            "metadata update is not supported on oss (path '{path}')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("app/a/b.txt"), "app/a/b.txt");
        assert_eq!(encode_key("app/with space.txt"), "app/with%20space.txt");
        assert_eq!(encode_key("app/a/"), "app/a/");
    }

    #[test]
    fn test_parse_http_time_rfc2822() {
        let ts = parse_http_time("Fri, 24 Feb 2012 08:42:32 GMT").unwrap();
        assert_eq!(ts, "2012-02-24T08:42:32Z".parse().unwrap());
    }

    #[test]
    fn test_parse_http_time_fallback_format() {
        let ts = parse_http_time("2012-02-24 08:42:32").unwrap();
        assert_eq!(ts, "2012-02-24T08:42:32Z".parse().unwrap());
    }

    #[test]
    fn test_parse_http_time_rejects_garbage() {
        assert!(matches!(
            parse_http_time("not a time"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_key_translation() {
        let storage = OssStorage::connect(OssConfig {
            endpoint: "oss-cn-hangzhou.aliyuncs.com".into(),
            access_key_id: "ak".into(),
            access_key_secret: "sk".into(),
            bucket: "bucket".into(),
            base_dir: "app".into(),
        })
        .unwrap();

        assert_eq!(storage.native_key("a/b.txt"), "app/a/b.txt");
        assert_eq!(storage.dir_prefix("a"), "app/a/");
        assert_eq!(storage.host, "bucket.oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(
            storage.object_url("app/a/b.txt"),
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/app/a/b.txt"
        );
    }

    #[test]
    fn test_http_endpoint_keeps_scheme() {
        let storage = OssStorage::connect(OssConfig {
            endpoint: "http://oss-cn-hangzhou-internal.aliyuncs.com".into(),
            access_key_id: "ak".into(),
            access_key_secret: "sk".into(),
            bucket: "bucket".into(),
            base_dir: "app".into(),
        })
        .unwrap();

        assert_eq!(storage.scheme, "http");
        assert_eq!(
            storage.object_url("app/a.txt"),
            "http://bucket.oss-cn-hangzhou-internal.aliyuncs.com/app/a.txt"
        );
    }

    #[test]
    fn test_https_endpoint_prefix_is_stripped() {
        let storage = OssStorage::connect(OssConfig {
            endpoint: "https://oss-cn-hangzhou.aliyuncs.com".into(),
            access_key_id: "ak".into(),
            access_key_secret: "sk".into(),
            bucket: "bucket".into(),
            base_dir: "app".into(),
        })
        .unwrap();

        assert_eq!(storage.scheme, "https");
        assert_eq!(storage.host, "bucket.oss-cn-hangzhou.aliyuncs.com");
    }
}
