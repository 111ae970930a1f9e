//! Error types for sitecheck-verify crate.
//!
//! Each variant is a failed verdict. All of them are terminal for the check
//! that raised them; nothing here is retried by the verifiers.

use sitecheck_types::{CompoundRemoteKey, ResourceAddress};
use thiserror::Error;

/// Reasons a verification check fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    /// The resource is not recorded in local state.
    #[error("not found in state: {0}")]
    NotInState(ResourceAddress),

    /// State lacks an attribute needed to address the resource remotely.
    #[error("{address}: state is missing {attribute}")]
    IncompleteState {
        address: ResourceAddress,
        attribute: String,
    },

    /// The remote lookup itself failed during an existence check.
    #[error("lookup of {key} failed: {reason}")]
    LookupFailed {
        key: CompoundRemoteKey,
        reason: String,
    },

    /// Recorded in state but absent remotely.
    #[error("{address} does not exist remotely at {key}")]
    ResourceAbsent {
        address: ResourceAddress,
        key: CompoundRemoteKey,
    },

    /// Still reachable remotely after teardown.
    #[error("{address} still exists at {key}:\n{representation:#}")]
    ResourceStillExists {
        address: ResourceAddress,
        key: CompoundRemoteKey,
        representation: serde_json::Value,
    },

    /// A structurally matching key holds a different value.
    #[error("{key} is {actual:?} (expected {expected:?})")]
    ValueMismatch {
        key: String,
        actual: String,
        expected: String,
    },

    /// No key matches the pattern.
    #[error("no attribute matching {pattern} in state")]
    AttributeNotFound { pattern: String },

    /// Imported state disagrees with applied state.
    #[error("{address}: imported {key} is {imported:?}, applied state has {applied:?}")]
    ImportMismatch {
        address: ResourceAddress,
        key: String,
        applied: Option<String>,
        imported: Option<String>,
    },

    /// A key pattern could not be parsed.
    #[error("invalid key pattern {0:?}")]
    InvalidPattern(String),

    /// The shared cancellation token fired during a blocking call.
    #[error("cancelled during {operation}")]
    Cancelled { operation: String },
}

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Outcome of one check: pass, or the reason it failed.
pub type Verdict = VerifyResult<()>;
