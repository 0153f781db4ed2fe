//! Turns the user's path argument into a service-relative request target.
//!
//! The API only accepts intra-service paths, so anything that looks like it
//! carries a host or a port is refused before a request is ever built.
//! Bytes that cannot appear in a request URI (spaces, non-ASCII, `<`, `"`,
//! ...) are percent-encoded; everything else, `%XX` escapes included, is
//! kept as typed.

use std::borrow::Cow;

use super::error::{RawError, Result};

static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// A resolved request target: physical path plus the untouched query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub path: String,
    pub query: Option<String>,
}

impl RequestTarget {
    /// Physical path with the query appended verbatim.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => {
                let mut out = String::with_capacity(self.path.len() + 1 + q.len());
                out.push_str(&self.path);
                out.push('?');
                out.push_str(q);
                out
            }
            None => self.path.clone(),
        }
    }
}

/// Parse `raw` into a target, mapping the logical path through `map`.
pub fn resolve<F>(raw: &str, map: F) -> Result<RequestTarget>
where
    F: Fn(&str) -> String,
{
    if raw.trim().is_empty() {
        return Err(RawError::Usage("a PATH argument is required".to_string()));
    }

    let (path, query) = match raw.find('?') {
        Some(pos) => (&raw[..pos], Some(&raw[pos + 1..])),
        None => (raw, None),
    };

    if let Some(reason) = authority_violation(path) {
        return Err(RawError::InvalidTarget {
            target: raw.to_string(),
            reason,
        });
    }

    let path = strip_empty_scheme(path);

    Ok(RequestTarget {
        path: map(encode_unsafe_bytes(path).as_ref()),
        query: query.map(|q| encode_unsafe_bytes(q).into_owned()),
    })
}

/// Percent-encode the bytes a request URI may not carry literally.
fn encode_unsafe_bytes(s: &str) -> Cow<'_, str> {
    let is_unsafe = |b: u8| {
        b <= b' '
            || b >= 0x7f
            || matches!(b, b'"' | b'#' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}' | b'[' | b']')
    };

    if !s.bytes().any(is_unsafe) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for byte in s.bytes() {
        if is_unsafe(byte) {
            out.push('%');
            out.push(HEX_UPPER[(byte >> 4) as usize] as char);
            out.push(HEX_UPPER[(byte & 0xf) as usize] as char);
        } else {
            out.push(byte as char);
        }
    }
    Cow::Owned(out)
}

/// Returns why `path` names a host or port, if it does.
fn authority_violation(path: &str) -> Option<&'static str> {
    if let Some((scheme, rest)) = path.split_once("://") {
        if is_scheme(scheme) {
            let authority = rest.split('/').next().unwrap_or("");
            if !authority.is_empty() {
                return Some("a host may not be specified");
            }
            return None;
        }
    }

    if let Some(rest) = path.strip_prefix("//") {
        let authority = rest.split('/').next().unwrap_or("");
        if !authority.is_empty() {
            return Some("a host may not be specified");
        }
        return None;
    }

    // `host:port/...` or `:port/...` without a scheme
    let first = path.split('/').next().unwrap_or("");
    if let Some((_, port)) = first.rsplit_once(':') {
        if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
            return Some("a port may not be specified");
        }
    }

    None
}

fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

/// `http:///foo` carries no authority; keep only its path.
fn strip_empty_scheme(path: &str) -> &str {
    match path.split_once(":///") {
        Some((scheme, _)) if is_scheme(scheme) => &path[scheme.len() + 3..],
        _ => path,
    }
}
