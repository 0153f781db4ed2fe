use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::Write;
use tracing::info;

use crate::core::Core;
use crate::raw::{self, Outcome, RawFlags, RequestSpec, Sinks, TraceOptions};
use crate::s3::{ResponseHead, StorageUri};

use super::args::{parse_storage_uri, OutputFormat};

/// Raw command: resolve, build, sign, send and report one request.
///
/// Returns `Ok` for any HTTP status; the response (or its error body) has
/// already been written to the sinks.
pub async fn cmd_raw(
    core: &Core,
    path: &str,
    flags: &RawFlags,
    options: TraceOptions,
    sinks: &mut Sinks<'_>,
) -> raw::Result<Outcome> {
    let client = core.client();
    let target = raw::resolve(path, |p| client.service_path(p))?;
    let request = RequestSpec::build(flags, &target)?;

    info!(method = %request.method, path = %request.path, "raw request");
    let outcome = raw::execute(client, client, request, options, sinks).await?;
    info!(status = outcome.status(), "raw request completed");

    Ok(outcome)
}

/// Info command: HEAD a bucket or object and print what came back
pub async fn cmd_info(core: &Core, uri: &str, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let uri = parse_storage_uri(uri)?;
    let head = core
        .client()
        .head_storage(&uri)
        .await
        .with_context(|| format!("HEAD {} failed", uri))?;

    out.write_all(render_info(&uri, &head, format)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct InfoReport<'a> {
    bucket: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    object: Option<&'a str>,
    status: u16,
    headers: BTreeMap<&'a str, &'a str>,
}

/// Render the headers of a bucket or object HEAD response
pub fn render_info(uri: &StorageUri, head: &ResponseHead, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = InfoReport {
                bucket: &uri.bucket,
                object: uri.object.as_deref(),
                status: head.status,
                headers: head
                    .headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect(),
            };
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            match &uri.object {
                Some(_) => {
                    let _ = writeln!(out, "Object: {}", uri);
                    if let Some(size) = head
                        .header("content-length")
                        .and_then(|v| v.trim().parse::<u64>().ok())
                    {
                        let _ = writeln!(out, "Size: {} ({})", format_bytes(size), size);
                    }
                }
                None => {
                    let _ = writeln!(out, "Bucket: {}", uri);
                }
            }
            if !head.headers.is_empty() {
                out.push_str("Headers:\n");
                for (name, value) in &head.headers {
                    let _ = writeln!(out, "  {}: {}", name, value);
                }
            }
            Ok(out)
        }
    }
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_head() -> ResponseHead {
        ResponseHead {
            version: "1.1".to_string(),
            status: 200,
            reason: "OK".to_string(),
            headers: vec![
                ("content-length".to_string(), "1536".to_string()),
                ("etag".to_string(), "\"9bb58f26192e4ba00f01e2e7b136bbd8\"".to_string()),
                ("content-type".to_string(), "text/plain".to_string()),
            ],
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_render_object_text() {
        let uri = parse_storage_uri("s3:mybucket/foo.txt").unwrap();
        let text = render_info(&uri, &object_head(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Object: s3:mybucket/foo.txt\n\
             Size: 1.50 KB (1536)\n\
             Headers:\n  \
             content-length: 1536\n  \
             etag: \"9bb58f26192e4ba00f01e2e7b136bbd8\"\n  \
             content-type: text/plain\n"
        );
    }

    #[test]
    fn test_render_bucket_text() {
        let uri = parse_storage_uri("s3:mybucket").unwrap();
        let head = ResponseHead {
            version: "1.1".to_string(),
            status: 200,
            reason: "OK".to_string(),
            headers: vec![("x-amz-bucket-region".to_string(), "us-east-1".to_string())],
        };
        let text = render_info(&uri, &head, OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Bucket: s3:mybucket\nHeaders:\n  x-amz-bucket-region: us-east-1\n"
        );
    }

    #[test]
    fn test_render_json() {
        let uri = parse_storage_uri("s3:mybucket/foo.txt").unwrap();
        let json = render_info(&uri, &object_head(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bucket"], "mybucket");
        assert_eq!(value["object"], "foo.txt");
        assert_eq!(value["status"], 200);
        assert_eq!(value["headers"]["content-type"], "text/plain");
    }
}
