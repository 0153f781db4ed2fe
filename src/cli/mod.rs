//! CLI module for s3raw
//!
//! Two commands share one signed HTTP pipeline:
//!
//! ```bash
//! # GET a listing, tracing the exchange on stderr
//! s3raw raw -v '/mybucket?list-type=2'
//!
//! # PUT a body (method inferred from --data)
//! s3raw raw -H 'Content-Type: application/json' -d '{"a":1}' /mybucket/a.json
//!
//! # Headers only
//! s3raw raw -X HEAD /mybucket/a.json
//!
//! # Bucket or object metadata
//! s3raw info s3:mybucket/a.json
//! ```
//!
//! Response bodies go to stdout, traces and logs to stderr. An HTTP error
//! response is printed and still exits 0.

pub mod args;
pub mod commands;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config;
use crate::core::Core;
use crate::raw::{Sinks, TraceOptions};
use args::{Cli, Commands};

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    debug!("CLI arguments: {:?}", cli);

    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())
        .context("Failed to load configuration")?;
    let core = Core::new(config, cli.profile.as_deref())?;

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();

    match &cli.command {
        Commands::Raw {
            verbose,
            include,
            path,
            ..
        } => {
            let flags = cli.command.raw_flags().unwrap_or_default();
            let options = TraceOptions {
                verbose: *verbose,
                include: *include,
            };
            let mut primary = stdout.lock();
            let mut trace = stderr.lock();
            let mut sinks = Sinks {
                primary: &mut primary,
                trace: &mut trace,
            };
            commands::cmd_raw(&core, path, &flags, options, &mut sinks).await?;
        }

        Commands::Info { format, uri } => {
            let mut out = stdout.lock();
            commands::cmd_info(&core, uri, *format, &mut out).await?;
        }
    }

    Ok(())
}

/// Initialize logging on stderr; `RUST_LOG` overrides `level`
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
