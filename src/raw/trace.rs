//! Wire-level trace rendering

use std::fmt::Write as FmtWrite;

use super::request::RequestSpec;
use crate::s3::ResponseHead;

/// `> METHOD PATH HTTP/1.1`, one `> Name: value` line per header, then the
/// body (if any) one `> line` per newline-separated line.
pub fn request_trace(request: &RequestSpec) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 48);
    let _ = writeln!(out, "> {} {} HTTP/1.1", request.method, request.path);
    for (name, value) in &request.headers {
        let _ = writeln!(out, "> {}: {}", name, value);
    }
    if let Some(body) = &request.body {
        for line in String::from_utf8_lossy(body).split('\n') {
            let _ = writeln!(out, "> {}", line);
        }
    }
    out
}

/// Status line, one `name: value` line per header, and a blank line.
pub fn response_trace(head: &ResponseHead) -> String {
    let mut out = String::with_capacity(32 + head.headers.len() * 48);
    let status_line = format!("HTTP/{} {} {}", head.version, head.status, head.reason);
    out.push_str(status_line.trim_end());
    out.push('\n');
    for (name, value) in &head.headers {
        let _ = writeln!(out, "{}: {}", name, value);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::request::Method;
    use bytes::Bytes;

    #[test]
    fn test_request_trace() {
        let mut request = RequestSpec::new(Method::Put, "/b/k?acl");
        request
            .headers
            .push(("Content-Type".to_string(), "text/plain".to_string()));
        request.headers.push(("host".to_string(), "localhost".to_string()));
        request.body = Some(Bytes::from_static(b"one\ntwo"));

        assert_eq!(
            request_trace(&request),
            "> PUT /b/k?acl HTTP/1.1\n\
             > Content-Type: text/plain\n\
             > host: localhost\n\
             > one\n\
             > two\n"
        );
    }

    #[test]
    fn test_response_trace() {
        let head = ResponseHead {
            version: "1.1".to_string(),
            status: 200,
            reason: "OK".to_string(),
            headers: vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("etag".to_string(), "\"abc\"".to_string()),
            ],
        };
        assert_eq!(
            response_trace(&head),
            "HTTP/1.1 200 OK\ncontent-type: text/plain\netag: \"abc\"\n\n"
        );
    }

    #[test]
    fn test_response_trace_without_reason() {
        let head = ResponseHead {
            version: "1.1".to_string(),
            status: 599,
            reason: String::new(),
            headers: Vec::new(),
        };
        assert_eq!(response_trace(&head), "HTTP/1.1 599\n\n");
    }
}
