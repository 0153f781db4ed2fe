//! s3raw - signed raw HTTP requests and HEAD metadata for S3-compatible storage

pub mod cli;
pub mod config;
pub mod core;
pub mod raw;
pub mod s3;

pub use config::Config;
pub use core::Core;
