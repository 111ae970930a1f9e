//! Error types for sitecheck-harness crate.

use sitecheck_arm::ArmError;
use sitecheck_topology::TopologyError;
use thiserror::Error;

use crate::provisioner::ProvisionError;

/// Errors that stop a scenario before or outside its checks.
///
/// Check failures are not errors at this level; they end up in the
/// scenario report.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The harness configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The topology could not be rendered. Nothing was applied.
    #[error("configuration error: {0}")]
    Configuration(#[from] TopologyError),

    /// The provisioning engine failed.
    #[error("{stage} failed: {source}")]
    Provision {
        stage: &'static str,
        #[source]
        source: ProvisionError,
    },

    /// The run was cancelled before `stage` finished.
    #[error("{stage} cancelled")]
    Cancelled { stage: &'static str },

    /// The remote lookup adapter could not be set up.
    #[error("remote lookup setup failed: {0}")]
    Arm(#[from] ArmError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
