//! Error types for sitecheck-arm crate.

use thiserror::Error;

/// Errors raised while setting up or authenticating the ARM client.
///
/// Failures of an individual lookup are reported as
/// [`sitecheck_verify::LookupError`] instead.
#[derive(Debug, Error)]
pub enum ArmError {
    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No bearer token could be obtained.
    #[error("token unavailable: {0}")]
    Token(String),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type for ARM client setup.
pub type ArmResult<T> = Result<T, ArmError>;
