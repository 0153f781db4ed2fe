//! AWS Signature Version 4 signer for S3 requests
//!
//! - Pre-computed AWS4+secret_key bytes
//! - Daily signing key cache (avoids 4 HMAC operations per request)
//! - Constant empty payload hash (avoids SHA256 for empty bodies)
//! - Zero-allocation URI encoding (hex lookup table, no format!())

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Hex lookup table for zero-allocation percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// SHA256 of the empty payload
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Signing failures
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("missing credentials: set an access key and secret key")]
    MissingCredentials,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// AWS Signature Version 4 signer
pub struct S3SignerV4 {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
    /// "AWS4" + secret_key as bytes
    aws4_key: Vec<u8>,
    /// Signing key per day: (date_stamp, derived_key)
    cached_signing_key: Mutex<Option<(String, [u8; 32])>>,
}

impl Clone for S3SignerV4 {
    fn clone(&self) -> Self {
        Self {
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            region: self.region.clone(),
            service: self.service.clone(),
            aws4_key: self.aws4_key.clone(),
            // Each clone gets its own cache (populated on first use)
            cached_signing_key: Mutex::new(None),
        }
    }
}

impl std::fmt::Debug for S3SignerV4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3SignerV4")
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl S3SignerV4 {
    /// Create a new S3 signer
    pub fn new(access_key: String, secret_key: String, region: Option<String>) -> Self {
        let region = region.unwrap_or_else(|| "us-east-1".to_string());
        let aws4_key = format!("AWS4{}", secret_key).into_bytes();
        Self {
            access_key,
            secret_key,
            region,
            service: "s3".to_string(),
            aws4_key,
            cached_signing_key: Mutex::new(None),
        }
    }

    /// Sign a request and return the headers to add to it.
    ///
    /// `url` is the full request URL (scheme, host, path, query). `headers` are
    /// the caller's headers; all of them are signed. The returned list holds
    /// `host` (unless the caller set one), `x-amz-content-sha256` (unless the
    /// caller set one, e.g. `UNSIGNED-PAYLOAD`), `x-amz-date` and
    /// `authorization`, in that order.
    pub fn sign_headers(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        payload: &[u8],
    ) -> Result<Vec<(String, String)>, SigningError> {
        self.sign_headers_at(Utc::now(), method, url, headers, payload)
    }

    fn sign_headers_at(
        &self,
        now: DateTime<Utc>,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        payload: &[u8],
    ) -> Result<Vec<(String, String)>, SigningError> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(SigningError::MissingCredentials);
        }

        let (host, path, query) = Self::parse_url_fast(url);

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        // Canonical form: lowercase names, sorted, repeated names joined by ','
        let mut canonical: BTreeMap<String, String> = BTreeMap::new();
        for (k, v) in headers {
            canonical
                .entry(k.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(v.trim());
                })
                .or_insert_with(|| v.trim().to_string());
        }

        let mut added = Vec::with_capacity(4);
        if !canonical.contains_key("host") {
            canonical.insert("host".to_string(), host.to_string());
            added.push(("host".to_string(), host.to_string()));
        }
        let payload_hash = match canonical.get("x-amz-content-sha256") {
            Some(hash) => hash.clone(),
            None => {
                let hash = if payload.is_empty() {
                    EMPTY_SHA256.to_string()
                } else {
                    hex::encode(Sha256::digest(payload))
                };
                canonical.insert("x-amz-content-sha256".to_string(), hash.clone());
                added.push(("x-amz-content-sha256".to_string(), hash.clone()));
                hash
            }
        };
        canonical.insert("x-amz-date".to_string(), amz_date.clone());
        added.push(("x-amz-date".to_string(), amz_date.clone()));

        let canonical_query = self.create_canonical_query_string(query);
        let canonical_headers = self.create_canonical_headers(&canonical);
        let signed_headers = self.create_signed_headers(&canonical);

        let canonical_uri = Self::create_canonical_uri(path);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_query, canonical_headers, signed_headers, payload_hash
        );

        tracing::trace!(
            method,
            host,
            path,
            canonical_request = %canonical_request,
            "sigv4 canonical request"
        );

        let credential_scope =
            format!("{}/{}/{}/aws4_request", date_stamp, self.region, self.service);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, amz_date, credential_scope, canonical_request_hash
        );

        let signature = self.calculate_signature(&date_stamp, &string_to_sign)?;

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );
        added.push(("authorization".to_string(), authorization));

        Ok(added)
    }

    /// Fast URL component extraction without heap allocation.
    ///
    /// Returns (host_with_port, path, query) as slices into the original URL.
    /// Strips default ports (:443 for https, :80 for http) from the host.
    fn parse_url_fast(url: &str) -> (&str, &str, &str) {
        let after_scheme = if let Some(rest) = url.strip_prefix("https://") {
            rest
        } else if let Some(rest) = url.strip_prefix("http://") {
            rest
        } else {
            url
        };

        let (authority, path_and_query) = match after_scheme.find('/') {
            Some(pos) => (&after_scheme[..pos], &after_scheme[pos..]),
            None => (after_scheme, "/"),
        };

        let (path, query) = match path_and_query.find('?') {
            Some(pos) => (&path_and_query[..pos], &path_and_query[pos + 1..]),
            None => (path_and_query, ""),
        };

        let host = if url.starts_with("https") {
            authority.strip_suffix(":443").unwrap_or(authority)
        } else {
            authority.strip_suffix(":80").unwrap_or(authority)
        };

        (host, path, query)
    }

    /// Canonical URI: every segment decoded, then re-encoded per RFC 3986.
    ///
    /// The server canonicalizes what it receives the same way, so `a:b` and
    /// `a%3Ab` sign identically. Paths made only of unreserved bytes and `/`
    /// are returned as-is.
    fn create_canonical_uri(path: &str) -> Cow<'_, str> {
        let already_canonical = path.bytes().all(|b| {
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/')
        });
        if already_canonical {
            return Cow::Borrowed(path);
        }

        let segments: Vec<String> = path
            .split('/')
            .map(|segment| {
                let decoded = urlencoding::decode(segment).unwrap_or_else(|_| segment.into());
                Self::uri_encode(&decoded, false)
            })
            .collect();
        Cow::Owned(segments.join("/"))
    }

    /// Create canonical query string (sorted by parameter name)
    ///
    /// Fast path: if every byte is already canonical, the parameters are sorted
    /// and all of them carry `=`, the query is returned as-is. Anything else
    /// (`/`, `+`, spaces, bare `?uploads`) is decoded, re-encoded and sorted.
    fn create_canonical_query_string(&self, query: &str) -> String {
        if query.is_empty() {
            return String::new();
        }

        let all_canonical = query.bytes().all(|b| matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'~'
            | b'=' | b'&' | b'%'
        ));

        if all_canonical {
            let mut sorted = true;
            let mut all_have_equals = true;
            let mut last_key: &str = "";
            for pair in query.split('&') {
                let key = match pair.find('=') {
                    Some(pos) => &pair[..pos],
                    None => {
                        all_have_equals = false;
                        pair
                    }
                };
                if key < last_key {
                    sorted = false;
                    break;
                }
                last_key = key;
            }
            if sorted && all_have_equals {
                return query.to_string();
            }
        }

        let mut params: Vec<(String, String)> = Vec::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_key = urlencoding::decode(key).unwrap_or_else(|_| key.into());
            let decoded_value = urlencoding::decode(value).unwrap_or_else(|_| value.into());
            params.push((
                Self::uri_encode(&decoded_key, true),
                Self::uri_encode(&decoded_value, true),
            ));
        }

        params.sort_unstable();

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn create_canonical_headers(&self, headers: &BTreeMap<String, String>) -> String {
        let mut result = String::with_capacity(headers.len() * 64);
        for (k, v) in headers {
            result.push_str(k);
            result.push(':');
            result.push_str(v);
            result.push('\n');
        }
        result
    }

    fn create_signed_headers(&self, headers: &BTreeMap<String, String>) -> String {
        headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
    }

    /// Calculate the signature, reusing the signing key while the date holds
    fn calculate_signature(
        &self,
        date_stamp: &str,
        string_to_sign: &str,
    ) -> Result<String, SigningError> {
        let signing_key = {
            let mut cache = self
                .cached_signing_key
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let hit = match cache.as_ref() {
                Some((cached_date, cached_key)) if cached_date == date_stamp => Some(*cached_key),
                _ => None,
            };
            match hit {
                Some(key) => key,
                None => {
                    let key = self.derive_signing_key(date_stamp)?;
                    *cache = Some((date_stamp.to_string(), key));
                    key
                }
            }
        };

        let signature = Self::hmac_sha256(&signing_key, string_to_sign.as_bytes())?;
        Ok(hex::encode(signature))
    }

    /// Derive signing key from date stamp (4 chained HMAC operations)
    fn derive_signing_key(&self, date_stamp: &str) -> Result<[u8; 32], SigningError> {
        let k_date = Self::hmac_sha256(&self.aws4_key, date_stamp.as_bytes())?;
        let k_region = Self::hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, self.service.as_bytes())?;
        Self::hmac_sha256(&k_service, b"aws4_request")
    }

    fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<[u8; 32], SigningError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        mac.update(msg);
        let result = mac.finalize().into_bytes();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Ok(output)
    }

    /// URI encode a string (RFC 3986) using hex lookup table
    fn uri_encode(s: &str, encode_slash: bool) -> String {
        let mut result = String::with_capacity(s.len() + 16);
        for byte in s.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    result.push(byte as char);
                }
                b'/' if !encode_slash => {
                    result.push('/');
                }
                _ => {
                    result.push('%');
                    result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                    result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
                }
            }
        }
        result
    }
}
