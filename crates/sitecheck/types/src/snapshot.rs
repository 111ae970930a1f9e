//! State snapshots.
//!
//! A [`StateSnapshot`] is everything one apply (or destroy) left behind: one
//! [`ResourceState`] per realized resource instance. Verifiers only ever
//! read snapshots; the provisioning side replaces them wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::ResourceAddress;
use crate::attributes::AttributeStore;

/// Realized state of one resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub address: ResourceAddress,

    /// Remote identifier assigned by the control plane.
    pub id: String,

    /// Flattened attributes.
    pub attributes: AttributeStore,
}

impl ResourceState {
    pub fn new(address: ResourceAddress, id: impl Into<String>, attributes: AttributeStore) -> Self {
        Self {
            address,
            id: id.into(),
            attributes,
        }
    }

    pub fn resource_type(&self) -> &str {
        self.address.resource_type()
    }
}

/// All resource instances produced by one provisioning operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Monotonic counter of the operation that produced this snapshot.
    pub serial: u64,

    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,

    resources: BTreeMap<ResourceAddress, ResourceState>,
}

impl StateSnapshot {
    pub fn new(serial: u64, resources: impl IntoIterator<Item = ResourceState>) -> Self {
        Self {
            serial,
            taken_at: Utc::now(),
            resources: resources
                .into_iter()
                .map(|r| (r.address.clone(), r))
                .collect(),
        }
    }

    /// Snapshot with no resources, as left by a clean destroy.
    pub fn empty(serial: u64) -> Self {
        Self::new(serial, std::iter::empty())
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Every instance of one resource type, in address order.
    pub fn of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a ResourceState> + 'a {
        self.resources
            .values()
            .filter(move |r| r.resource_type() == resource_type)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceState> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ty: &str, name: &str) -> ResourceState {
        ResourceState::new(
            ResourceAddress::new(ty, name),
            format!("/{ty}/{name}"),
            AttributeStore::default(),
        )
    }

    #[test]
    fn test_of_type_filters() {
        let snapshot = StateSnapshot::new(
            1,
            [
                state("azurerm_site_recovery_fabric", "test1"),
                state("azurerm_site_recovery_replicated_vm", "test"),
                state("azurerm_site_recovery_fabric", "test2"),
            ],
        );

        let fabrics: Vec<&str> = snapshot
            .of_type("azurerm_site_recovery_fabric")
            .map(|r| r.address.name())
            .collect();
        assert_eq!(fabrics, vec!["test1", "test2"]);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StateSnapshot::empty(7);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.serial, 7);
        assert_eq!(snapshot.of_type("anything").count(), 0);
    }
}
