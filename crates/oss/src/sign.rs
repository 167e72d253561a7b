//! OSS V4 request signing
//!
//! Computes the `OSS4-HMAC-SHA256` authorization header: canonical request,
//! string to sign, and a date/region/service key-derivation chain, all over
//! HMAC-SHA256. The signing region is derived from the endpoint host, e.g.
//! `oss-cn-hangzhou.aliyuncs.com` signs for `cn-hangzhou`.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Payload hash for requests whose body is not hashed, such as streaming
/// uploads
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Signs OSS requests with a fixed credential pair
#[derive(Clone)]
pub struct RequestSigner {
    access_key_id: String,
    access_key_secret: String,
    region: String,
}

impl RequestSigner {
    pub fn new(access_key_id: &str, access_key_secret: &str, endpoint: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
            region: region_from_endpoint(endpoint),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Compute the authorization header for one request.
    ///
    /// `resource` is the canonical URI (`/{bucket}/{key}`), `headers` must
    /// already contain every header participating in the signature, and
    /// `date_time`/`date` are the `%Y%m%dT%H%M%SZ` and `%Y%m%d` renderings
    /// of the same instant carried in `x-oss-date`.
    #[allow(clippy::too_many_arguments)]
    pub fn sign(
        &self,
        method: &str,
        resource: &str,
        query: &str,
        headers: &BTreeMap<String, String>,
        payload_hash: &str,
        date_time: &str,
        date: &str,
    ) -> String {
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();

        // OSS leaves the additional-headers line empty when none are used
        let canonical_request = format!(
            "{method}\n{resource}\n{query}\n{canonical_headers}\n\n{payload_hash}"
        );

        let request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let scope = format!("{date}/{}/oss/aliyun_v4_request", self.region);
        let string_to_sign = format!("OSS4-HMAC-SHA256\n{date_time}\n{scope}\n{request_hash}");

        let signing_key = derive_signing_key(&self.access_key_secret, date, &self.region);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "OSS4-HMAC-SHA256 Credential={}/{scope},Signature={signature}",
            self.access_key_id
        )
    }
}

fn derive_signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let key = format!("aliyun_v4{secret}");
    let k_date = hmac_sha256(key.as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, b"oss");
    hmac_sha256(&k_service, b"aliyun_v4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).unwrap_or_else(|_| unreachable!());
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// SHA-256 of the empty body, for bodyless requests
pub fn empty_payload_hash() -> String {
    hex::encode(Sha256::digest(b""))
}

/// Derive the signing region from the endpoint host.
///
/// The region is the first host label with the `oss-` prefix and the
/// `-internal` suffix removed; a scheme on the endpoint is tolerated.
pub fn region_from_endpoint(endpoint: &str) -> String {
    let host = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint);
    let label = host.split('.').next().unwrap_or(host);
    let label = label.strip_prefix("oss-").unwrap_or(label);
    let label = label.strip_suffix("-internal").unwrap_or(label);
    label.to_string()
}
