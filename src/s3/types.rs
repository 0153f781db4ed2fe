//! S3 types and response structures

use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;

use super::client::S3Error;

/// Lazily delivered response body chunks, in arrival order
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, S3Error>> + Send>>;

/// Status line and headers of a response, captured when they arrive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// HTTP version without the `HTTP/` prefix ("1.1", "2")
    pub version: String,
    pub status: u16,
    /// Canonical reason phrase; empty for unregistered codes
    pub reason: String,
    /// Header name/value pairs in wire order
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Case-insensitive header lookup (first match)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Error body as handed back by the transport.
///
/// JSON bodies have already been decoded by the time the engine sees them,
/// so their original bytes (whitespace, key order) are not preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Structured(serde_json::Value),
    Raw(Bytes),
}

impl ErrorBody {
    /// Classify a fully read error body. Empty bodies yield `None`.
    pub fn from_bytes(content_type: Option<&str>, bytes: Bytes) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        if is_json {
            if let Ok(value) = serde_json::from_slice(&bytes) {
                return Some(ErrorBody::Structured(value));
            }
        }
        Some(ErrorBody::Raw(bytes))
    }
}

/// What follows the headers
pub enum ResponseBody {
    /// Success body, still on the wire
    Stream(ChunkStream),
    /// Error body, already read in full by the transport
    Error(Option<ErrorBody>),
    /// Nothing to read (HEAD)
    Empty,
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
            ResponseBody::Error(body) => f.debug_tuple("Error").field(body).finish(),
            ResponseBody::Empty => f.write_str("Empty"),
        }
    }
}

/// A response as soon as its headers have arrived
#[derive(Debug)]
pub struct ResponseEnvelope {
    pub head: ResponseHead,
    pub body: ResponseBody,
}

/// Bucket, and optionally an object within it, named by an `s3:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub bucket: String,
    pub object: Option<String>,
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => write!(f, "s3:{}/{}", self.bucket, object),
            None => write!(f, "s3:{}", self.bucket),
        }
    }
}
