//! S3 client: signs requests and carries them over HTTP
//!
//! - HTTP/1.1 only, TCP_NODELAY, connect timeout and keepalive on the connector
//! - native-tls (OpenSSL) for TLS
//! - Success bodies are handed back as a lazy chunk stream; error bodies are
//!   read in full so they can be reported as one piece
//! - No retries: a failed request is reported as-is

use bytes::Bytes;
use futures::{future, TryStreamExt};
use http_body_util::{BodyExt, BodyStream, Full};
use hyper::{Request, StatusCode, Version};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::raw::{Method, RequestSpec, Signer, Transport};
use crate::s3::signer::{S3SignerV4, SigningError};
use crate::s3::types::{ErrorBody, ResponseBody, ResponseEnvelope, ResponseHead, StorageUri};

/// Hex lookup table for URI encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3Error {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("S3 error: {status} - {message}")]
    S3Response { status: StatusCode, message: String },

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

}

pub type Result<T> = std::result::Result<T, S3Error>;

impl From<hyper_util::client::legacy::Error> for S3Error {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        S3Error::InvalidResponse(format!("Client error: {}", err))
    }
}

/// S3 client bound to one endpoint.
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct S3Client {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    signer: S3SignerV4,
    /// Base URL, e.g. `https://s3.example.com` (no trailing slash)
    endpoint: String,
    /// Path the service is mounted under, e.g. `/storage` (no trailing slash)
    path_prefix: Option<String>,
}

impl S3Client {
    /// Create a client for `endpoint` signing with the given credentials
    pub fn new(
        endpoint: &str,
        access_key: String,
        secret_key: String,
        region: Option<String>,
    ) -> Result<Self> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = TlsConnector::new()?;
        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .retry_canceled_requests(false)
            .set_host(true)
            .build(https);

        Ok(Self {
            client,
            signer: S3SignerV4::new(access_key, secret_key, region),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            path_prefix: None,
        })
    }

    /// Mount every service path under `prefix`
    pub fn with_path_prefix(mut self, prefix: Option<String>) -> Self {
        self.path_prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{}", p));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Map a logical path to the physical API path.
    ///
    /// Adds the leading slash if missing and prepends the configured prefix.
    pub fn service_path(&self, logical: &str) -> String {
        let prefix = self.path_prefix.as_deref().unwrap_or("");
        let mut path = String::with_capacity(prefix.len() + logical.len() + 1);
        path.push_str(prefix);
        if !logical.starts_with('/') {
            path.push('/');
        }
        path.push_str(logical);
        path
    }

    /// Physical path of a bucket, or of an object within it
    pub fn storage_path(&self, uri: &StorageUri) -> String {
        match &uri.object {
            Some(key) => {
                let encoded = Self::encode_s3_key(key);
                let mut logical = String::with_capacity(uri.bucket.len() + 1 + encoded.len());
                logical.push_str(&uri.bucket);
                logical.push('/');
                logical.push_str(&encoded);
                self.service_path(&logical)
            }
            None => self.service_path(&uri.bucket),
        }
    }

    /// Full URL for a physical path (which may carry a query)
    pub fn url_for(&self, path: &str) -> String {
        let mut url = String::with_capacity(self.endpoint.len() + path.len() + 1);
        url.push_str(&self.endpoint);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        url
    }

    /// Encode an S3 key, preserving forward slashes
    /// Returns Cow::Borrowed when no encoding is needed
    fn encode_s3_key(key: &str) -> Cow<'_, str> {
        let needs_encoding = key
            .bytes()
            .any(|b| !matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/'));

        if !needs_encoding {
            return Cow::Borrowed(key);
        }

        let mut result = String::with_capacity(key.len() + 32);
        for byte in key.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                    result.push(byte as char);
                }
                _ => {
                    result.push('%');
                    result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                    result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
                }
            }
        }
        Cow::Owned(result)
    }

    /// Signed HEAD against a physical path.
    ///
    /// Fails with `S3Response` when the service answers with an error status.
    pub async fn head(&self, path: &str) -> Result<ResponseHead> {
        let mut request = RequestSpec::new(Method::Head, path);
        self.sign(&mut request).await?;

        let envelope = self.dispatch(&request).await?;
        let head = envelope.head;
        if head.is_error() {
            let status = StatusCode::from_u16(head.status)
                .map_err(|e| S3Error::InvalidResponse(e.to_string()))?;
            let message = match head.header("x-amz-error-code") {
                Some(code) => code.to_string(),
                None => format!("HEAD {} failed", path),
            };
            return Err(S3Error::S3Response { status, message });
        }
        Ok(head)
    }

    /// HEAD the bucket or object a storage URI names
    pub async fn head_storage(&self, uri: &StorageUri) -> Result<ResponseHead> {
        let path = self.storage_path(uri);
        debug!(uri = %uri, path = %path, "head storage target");
        self.head(&path).await
    }
}

impl Signer for S3Client {
    async fn sign(&self, request: &mut RequestSpec) -> std::result::Result<(), SigningError> {
        let url = self.url_for(&request.path);
        let added = self.signer.sign_headers(
            request.method.as_str(),
            &url,
            &request.headers,
            request.body_bytes(),
        )?;
        request.headers.extend(added);
        Ok(())
    }
}

impl Transport for S3Client {
    async fn dispatch(&self, request: &RequestSpec) -> Result<ResponseEnvelope> {
        let url = self.url_for(&request.path);

        let mut req = Request::builder()
            .method(hyper::Method::from(request.method))
            .uri(&url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let http_request = req.body(Full::new(request.body.clone().unwrap_or_default()))?;

        debug!(method = %request.method, url = %url, "dispatching request");
        let response = self.client.request(http_request).await?;
        let (parts, incoming) = response.into_parts();

        let head = ResponseHead {
            version: version_str(parts.version).to_string(),
            status: parts.status.as_u16(),
            reason: parts.status.canonical_reason().unwrap_or("").to_string(),
            headers: parts
                .headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        };

        let body = if request.method == Method::Head {
            ResponseBody::Empty
        } else if head.is_error() {
            let bytes = incoming.collect().await?.to_bytes();
            ResponseBody::Error(ErrorBody::from_bytes(head.header("content-type"), bytes))
        } else {
            let chunks = BodyStream::new(incoming)
                .try_filter_map(|frame| future::ready(Ok(frame.into_data().ok())))
                .map_err(S3Error::Hyper);
            ResponseBody::Stream(Box::pin(chunks))
        };

        Ok(ResponseEnvelope { head, body })
    }
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else if version == Version::HTTP_3 {
        "3"
    } else {
        "1.1"
    }
}
