//! Provisioning engine seam.
//!
//! The harness never creates infrastructure itself. It hands a rendered
//! topology to a [`Provisioner`] and gets back the state the engine
//! recorded.

use async_trait::async_trait;
use sitecheck_topology::RenderedTopology;
use sitecheck_types::{AttributeStore, ResourceAddress, StateSnapshot};
use thiserror::Error;

/// Opaque failure reported by the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProvisionError {
    pub message: String,
}

impl ProvisionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Applies and tears down topologies.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Realize `topology` and return the resulting state.
    async fn apply(&self, topology: &RenderedTopology) -> Result<StateSnapshot, ProvisionError>;

    /// Tear down everything `topology` realized.
    async fn destroy(&self, topology: &RenderedTopology) -> Result<(), ProvisionError>;

    /// Read an existing resource back by remote id, as a fresh import would.
    async fn import(
        &self,
        address: &ResourceAddress,
        id: &str,
    ) -> Result<AttributeStore, ProvisionError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "provisioner"
    }
}
