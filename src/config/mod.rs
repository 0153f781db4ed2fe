use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Endpoint and credentials for one S3 service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Service base URL
    pub endpoint: String,

    /// AWS access key ID
    pub access_key: String,

    /// AWS secret access key
    pub secret_key: String,

    /// AWS region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    /// Path the API is mounted under, prepended to every request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Named profiles for different S3 services
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a profile by name, or the default profile if not specified
    pub fn get_profile(&self, name: Option<&str>) -> Option<&Profile> {
        if let Some(name) = name {
            self.profiles.get(name)
        } else if let Some(default) = &self.default_profile {
            self.profiles.get(default)
        } else if self.profiles.len() == 1 {
            self.profiles.values().next()
        } else {
            None
        }
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    Ok(config)
}

/// Load configuration from environment variables
///
/// - S3_ENDPOINT (service base URL)
/// - AWS_ACCESS_KEY_ID / S3_KEY
/// - AWS_SECRET_ACCESS_KEY / S3_SECRET
/// - AWS_REGION (optional, defaults to us-east-1)
/// - S3_PATH_PREFIX (optional)
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let endpoint =
        std::env::var("S3_ENDPOINT").context("S3_ENDPOINT environment variable not set")?;
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        anyhow::bail!("S3_ENDPOINT is empty");
    }

    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("S3_KEY"))
        .context("Neither AWS_ACCESS_KEY_ID nor S3_KEY environment variable is set")?;

    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("S3_SECRET"))
        .context("Neither AWS_SECRET_ACCESS_KEY nor S3_SECRET environment variable is set")?;

    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| default_region());

    let path_prefix = std::env::var("S3_PATH_PREFIX")
        .ok()
        .filter(|p| !p.trim().is_empty());

    let mut config = Config::new();
    config.profiles.insert(
        "default".to_string(),
        Profile {
            endpoint,
            access_key,
            secret_key,
            region,
            path_prefix,
        },
    );
    config.default_profile = Some("default".to_string());

    Ok(config)
}

/// Load configuration from a YAML file when one is given, else from the
/// environment. A requested profile must exist in the file.
pub fn load_config(config_path: Option<&str>, profile_name: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        let mut config = load_from_yaml(path)?;

        if let Some(name) = profile_name {
            if !config.profiles.contains_key(name) {
                anyhow::bail!("Profile '{}' not found in config file", name);
            }
            config.default_profile = Some(name.to_string());
        }

        Ok(config)
    } else {
        load_from_env()
    }
}
