//! Raw request pipeline
//!
//! A user path goes through [`target::resolve`], becomes a [`RequestSpec`]
//! via [`RequestSpec::build`], and is then signed, sent and reported by
//! [`engine::execute`]. Signing and transport are collaborators behind the
//! [`Signer`] and [`Transport`] traits; [`crate::s3::S3Client`] implements both.

pub mod engine;
pub mod error;
pub mod request;
pub mod target;
pub mod trace;

use std::io::Write;

use crate::s3::{ResponseEnvelope, SigningError};

pub use engine::{execute, Outcome, Phase, TraceOptions};
pub use error::{RawError, Result};
pub use request::{Method, RawFlags, RequestSpec};
pub use target::{resolve, RequestTarget};

/// Adds authentication headers to a request before it is sent.
#[allow(async_fn_in_trait)]
pub trait Signer {
    async fn sign(&self, request: &mut RequestSpec) -> std::result::Result<(), SigningError>;
}

/// Sends a signed request and hands back the response once its headers are in.
///
/// Implementations read error bodies (status >= 400) in full before
/// returning, and leave success bodies on the wire as a chunk stream.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn dispatch(&self, request: &RequestSpec) -> crate::s3::Result<ResponseEnvelope>;
}

/// Output streams for one invocation
pub struct Sinks<'a> {
    /// Response headers (when shown) and body content
    pub primary: &'a mut dyn Write,
    /// Verbose request/response trace
    pub trace: &'a mut dyn Write,
}
