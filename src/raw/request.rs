use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use std::fmt;
use std::str::FromStr;

use super::error::{RawError, Result};
use super::target::RequestTarget;

/// HTTP verbs the raw command is allowed to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Head,
    Options,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RawError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "POST" => Ok(Method::Post),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "DELETE" => Ok(Method::Delete),
            _ => Err(RawError::UnknownMethod(s.to_string())),
        }
    }
}

impl From<Method> for hyper::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => hyper::Method::GET,
            Method::Put => hyper::Method::PUT,
            Method::Post => hyper::Method::POST,
            Method::Head => hyper::Method::HEAD,
            Method::Options => hyper::Method::OPTIONS,
            Method::Delete => hyper::Method::DELETE,
        }
    }
}

/// Request-shaping flags of the raw command, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RawFlags {
    pub method: Option<String>,
    pub headers: Vec<String>,
    pub data: Option<String>,
}

/// A fully described request: what the signer signs and the transport sends.
///
/// `headers` keeps insertion order; it only matters for trace output.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestSpec {
    /// Build a request from raw-command flags and a resolved target.
    pub fn build(flags: &RawFlags, target: &RequestTarget) -> Result<Self> {
        let data = flags.data.as_deref().filter(|d| !d.is_empty());

        let method = match flags.method.as_deref() {
            Some(m) => m.parse()?,
            None if data.is_some() => Method::Put,
            None => Method::Get,
        };

        let headers = flags
            .headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            method,
            path: target.path_and_query(),
            headers,
            body: data.map(|d| Bytes::copy_from_slice(d.as_bytes())),
        })
    }

    /// A bodiless request with no extra headers
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Case-insensitive header lookup (first match)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or(&[])
    }
}

/// Split `NAME:VALUE` at the first colon, trimming leading space off the value.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| RawError::MalformedHeader(raw.to_string()))?;
    let value = value.trim_start();

    if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
        return Err(RawError::MalformedHeader(raw.to_string()));
    }

    Ok((name.to_string(), value.to_string()))
}
