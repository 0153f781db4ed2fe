use thiserror::Error;

use crate::s3::{S3Error, SigningError};

/// Errors that stop a raw request before or while it runs.
///
/// An HTTP status >= 400 is not one of these: the engine reports error
/// responses as a normal outcome.
#[derive(Error, Debug)]
pub enum RawError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid path {target:?}: {reason}")]
    InvalidTarget { target: String, reason: &'static str },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("malformed header {0:?}: expected NAME:VALUE")]
    MalformedHeader(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Transport(#[from] S3Error),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RawError>;
