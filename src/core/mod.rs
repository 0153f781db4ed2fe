use anyhow::{Context, Result};

use crate::config::Config;
use crate::s3::S3Client;

/// Per-invocation context shared by the raw and info commands
#[derive(Clone)]
pub struct Core {
    client: S3Client,
}

impl Core {
    /// Pick the profile (named, or the configured default) and build its client
    pub fn new(config: Config, profile_name: Option<&str>) -> Result<Self> {
        let profile = config
            .get_profile(profile_name)
            .ok_or_else(|| match profile_name {
                Some(name) => anyhow::anyhow!("Profile '{}' not found in configuration", name),
                None => anyhow::anyhow!("No default profile in configuration; use --profile"),
            })?;

        let client = S3Client::new(
            &profile.endpoint,
            profile.access_key.clone(),
            profile.secret_key.clone(),
            Some(profile.region.clone()),
        )
        .context("Failed to create S3 client")?
        .with_path_prefix(profile.path_prefix.clone());

        tracing::debug!(
            endpoint = %client.endpoint(),
            region = %profile.region,
            "core initialized"
        );

        Ok(Self { client })
    }

    /// The client signs and carries every request of this invocation
    pub fn client(&self) -> &S3Client {
        &self.client
    }
}
