//! S3 client module with AWS SigV4 signing
//!
//! This module provides:
//! - AWS Signature Version 4 signing for S3 requests
//! - The HTTP transport used by the raw and info commands
//! - Response and storage URI types

pub mod client;
pub mod signer;
pub mod types;

pub use client::{Result, S3Client, S3Error};
pub use signer::{S3SignerV4, SigningError};
pub use types::{ChunkStream, ErrorBody, ResponseBody, ResponseEnvelope, ResponseHead, StorageUri};
