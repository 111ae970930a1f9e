//! Compound remote keys.
//!
//! A replicated item is addressed at the remote API by a chain of scopes:
//! resource group, vault, fabric, protection container and finally the item
//! name. None of these are stored separately; they are read back out of the
//! item's own attribute store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attributes::AttributeStore;
use crate::error::TypesResult;

/// Scoping identifiers that address one resource at the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundRemoteKey {
    pub resource_group: String,
    pub vault: String,
    pub fabric: String,
    pub protection_container: String,
    pub name: String,
}

impl fmt::Display for CompoundRemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resourceGroups/{}/vaults/{}/replicationFabrics/{}/replicationProtectionContainers/{}/items/{}",
            self.resource_group, self.vault, self.fabric, self.protection_container, self.name
        )
    }
}

/// Names of the attributes a [`CompoundRemoteKey`] is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub resource_group: String,
    pub vault: String,
    pub fabric: String,
    pub protection_container: String,
    pub name: String,
}

impl KeySchema {
    /// Schema for replicated VMs, keyed by their source side.
    pub fn replicated_vm() -> Self {
        Self {
            resource_group: "resource_group_name".into(),
            vault: "recovery_vault_name".into(),
            fabric: "source_recovery_fabric_name".into(),
            protection_container: "source_recovery_protection_container_name".into(),
            name: "name".into(),
        }
    }

    /// Read a key out of a store. Every component must be present and
    /// non-empty.
    pub fn extract(&self, attributes: &AttributeStore) -> TypesResult<CompoundRemoteKey> {
        Ok(CompoundRemoteKey {
            resource_group: attributes.require(&self.resource_group)?.to_string(),
            vault: attributes.require(&self.vault)?.to_string(),
            fabric: attributes.require(&self.fabric)?.to_string(),
            protection_container: attributes.require(&self.protection_container)?.to_string(),
            name: attributes.require(&self.name)?.to_string(),
        })
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::replicated_vm()
    }
}
