use clap::{Parser, Subcommand};

use crate::raw::RawFlags;
use crate::s3::StorageUri;

/// s3raw - signed raw HTTP requests against S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "s3raw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (YAML); the environment is used when absent
    #[arg(long, global = true, env = "S3RAW_CONFIG")]
    pub config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true, env = "S3RAW_PROFILE")]
    pub profile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a signed request to a service path and print the response
    Raw {
        /// Trace the request and response headers on stderr
        #[arg(short, long)]
        verbose: bool,

        /// HTTP method (default: PUT with --data, GET otherwise)
        #[arg(short = 'X', long, value_name = "METHOD")]
        method: Option<String>,

        /// Request header, repeatable
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,

        /// Print the response headers before the body
        #[arg(short, long)]
        include: bool,

        /// Request body, sent as-is
        #[arg(short, long, value_name = "DATA", allow_hyphen_values = true)]
        data: Option<String>,

        /// Service path, optionally with a query string (/bucket/key?acl)
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Show metadata for a bucket or object (HEAD)
    Info {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Storage URI (s3:bucket or s3:bucket/object)
        #[arg(value_name = "URI")]
        uri: String,
    },
}

impl Commands {
    /// Request-shaping flags of the raw command
    pub fn raw_flags(&self) -> Option<RawFlags> {
        match self {
            Commands::Raw {
                method,
                headers,
                data,
                ..
            } => Some(RawFlags {
                method: method.clone(),
                headers: headers.clone(),
                data: data.clone(),
            }),
            Commands::Info { .. } => None,
        }
    }
}

/// Parse a storage URI into bucket and object components
///
/// Accepts `s3:bucket/key`, the URI-style `s3://bucket/key` and the
/// mc-compatible `s3/bucket/key`.
pub fn parse_storage_uri(uri: &str) -> anyhow::Result<StorageUri> {
    let uri = uri.trim();

    let stripped = if let Some(p) = uri.strip_prefix("s3://") {
        p
    } else if let Some(p) = uri.strip_prefix("s3:") {
        p
    } else if let Some(p) = uri.strip_prefix("s3/") {
        p
    } else {
        anyhow::bail!("Invalid storage URI {:?}. Expected: s3:bucket[/object]", uri);
    };

    let (bucket, object) = match stripped.split_once('/') {
        Some((bucket, object)) => (bucket, Some(object)),
        None => (stripped, None),
    };

    if bucket.is_empty() {
        anyhow::bail!("Bucket name cannot be empty");
    }

    Ok(StorageUri {
        bucket: bucket.to_string(),
        object: object.filter(|o| !o.is_empty()).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(bucket: &str, object: Option<&str>) -> StorageUri {
        StorageUri {
            bucket: bucket.to_string(),
            object: object.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_storage_uri() {
        assert_eq!(parse_storage_uri("s3:mybucket").unwrap(), uri("mybucket", None));
        assert_eq!(
            parse_storage_uri("s3:mybucket/foo.txt").unwrap(),
            uri("mybucket", Some("foo.txt"))
        );
        assert_eq!(
            parse_storage_uri("s3:mybucket/path/to/object.txt").unwrap(),
            uri("mybucket", Some("path/to/object.txt"))
        );
        assert_eq!(parse_storage_uri("s3:mybucket/").unwrap(), uri("mybucket", None));

        assert_eq!(
            parse_storage_uri("s3://mybucket/mykey").unwrap(),
            uri("mybucket", Some("mykey"))
        );
        assert_eq!(
            parse_storage_uri("s3/mybucket/mykey").unwrap(),
            uri("mybucket", Some("mykey"))
        );

        assert!(parse_storage_uri("mybucket").is_err());
        assert!(parse_storage_uri("s3:").is_err());
        assert!(parse_storage_uri("s3:/key").is_err());
        assert!(parse_storage_uri("http://mybucket").is_err());
    }

    #[test]
    fn test_raw_flags_parse() {
        let cli = Cli::try_parse_from([
            "s3raw", "raw", "-v", "-X", "post", "-H", "a: 1", "--header", "b:2", "-d", "-x",
            "/bucket?uploads",
        ])
        .unwrap();

        match &cli.command {
            Commands::Raw {
                verbose,
                include,
                path,
                ..
            } => {
                assert!(*verbose);
                assert!(!*include);
                assert_eq!(path, "/bucket?uploads");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let flags = cli.command.raw_flags().unwrap();
        assert_eq!(flags.method.as_deref(), Some("post"));
        assert_eq!(flags.headers, vec!["a: 1".to_string(), "b:2".to_string()]);
        assert_eq!(flags.data.as_deref(), Some("-x"));
    }

    #[test]
    fn test_raw_requires_one_path() {
        assert!(Cli::try_parse_from(["s3raw", "raw"]).is_err());
        assert!(Cli::try_parse_from(["s3raw", "raw", "/a", "/b"]).is_err());
    }

    #[test]
    fn test_info_parse() {
        let cli =
            Cli::try_parse_from(["s3raw", "info", "--format", "json", "s3:b/k"]).unwrap();
        match cli.command {
            Commands::Info { format, uri } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(uri, "s3:b/k");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["s3raw", "info"]).is_err());
    }
}
