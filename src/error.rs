// src/error.rs

//! Crate-wide error type
//!
//! Every fallible library operation returns [`Result`]. Variants carry
//! pre-formatted message strings; callers attach context with `format!`
//! at the point of failure.

use thiserror::Error;

/// Errors produced by the satdex library
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to construct a client or other startup resource
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Configuration file missing, unreadable, or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Local filesystem operation failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// HTTP fetch from the content source failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Page payload could not be decoded into a dense array
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Remote store lookup or write-protocol failure (other than not-found)
    #[error("Remote store error: {0}")]
    StoreError(String),
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
