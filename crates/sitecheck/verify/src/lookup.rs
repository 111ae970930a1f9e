//! Remote lookup seam.
//!
//! Implementations address one resource by its [`CompoundRemoteKey`] and
//! report whether it exists. "Not found" is a successful lookup; only a
//! failure to get an answer is a [`LookupError`]. The two verifiers treat
//! those cases differently, so implementations must keep them apart.

use async_trait::async_trait;
use sitecheck_types::CompoundRemoteKey;
use thiserror::Error;

/// Answer to a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The resource exists; carries its remote representation.
    Found(serde_json::Value),
    /// The control plane answered that the resource does not exist.
    NotFound,
}

impl LookupOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }
}

/// Failure to obtain an answer from the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Connection, TLS or similar failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with something other than found/not-found.
    #[error("unexpected status {status}: {body}")]
    Protocol { status: u16, body: String },

    /// No answer within the configured timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Capability to read one resource from the remote control plane.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    async fn lookup(&self, key: &CompoundRemoteKey) -> Result<LookupOutcome, LookupError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "remote"
    }
}
