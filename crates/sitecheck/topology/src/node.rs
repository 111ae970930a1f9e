//! Resource nodes and property values.

use serde::{Deserialize, Serialize};
use sitecheck_types::ResourceAddress;
use std::collections::BTreeSet;

/// Reference to an attribute of another declared resource.
///
/// `attribute` is a flattened path; `storage_os_disk.0.managed_disk_id`
/// renders as `storage_os_disk[0].managed_disk_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub target: ResourceAddress,
    pub attribute: String,
}

impl Reference {
    pub fn new(target: ResourceAddress, attribute: impl Into<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
        }
    }
}

/// Value of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// String literal; may contain `{placeholder}`s until rendered.
    Text(String),
    Integer(i64),
    Bool(bool),
    /// Attribute of another node, resolved by the provisioning engine.
    Ref(Reference),
    List(Vec<PropertyValue>),
    /// Repeated nested sub-blocks, in declaration order.
    Blocks(Vec<Block>),
}

impl PropertyValue {
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text(value.into())
    }

    pub fn reference(target: &ResourceAddress, attribute: impl Into<String>) -> Self {
        PropertyValue::Ref(Reference::new(target.clone(), attribute))
    }

    /// Every reference reachable from this value.
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a Reference>) {
        match self {
            PropertyValue::Ref(r) => refs.push(r),
            PropertyValue::List(items) => {
                for item in items {
                    item.collect_references(refs);
                }
            }
            PropertyValue::Blocks(blocks) => {
                for block in blocks {
                    for (_, value) in &block.properties {
                        value.collect_references(refs);
                    }
                }
            }
            PropertyValue::Text(_) | PropertyValue::Integer(_) | PropertyValue::Bool(_) => {}
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Reference> for PropertyValue {
    fn from(value: Reference) -> Self {
        PropertyValue::Ref(value)
    }
}

/// One nested sub-block, e.g. a `network_interface` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub properties: Vec<(String, PropertyValue)>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// One declared infrastructure resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub address: ResourceAddress,

    /// Properties in declaration order.
    pub properties: Vec<(String, PropertyValue)>,

    /// Nodes that must be realized before this one.
    pub depends_on: BTreeSet<ResourceAddress>,
}

impl ResourceNode {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: ResourceAddress::new(resource_type, name),
            properties: Vec::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Set a property. Setting the same name twice replaces the value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.properties.iter().position(|(n, _)| *n == name) {
            Some(i) => self.properties[i].1 = value,
            None => self.properties.push((name, value)),
        }
        self
    }

    /// Append a nested sub-block to the named collection.
    pub fn with_block(mut self, name: impl Into<String>, block: Block) -> Self {
        let name = name.into();
        match self.properties.iter().position(|(n, _)| *n == name) {
            Some(i) => match &mut self.properties[i].1 {
                PropertyValue::Blocks(blocks) => blocks.push(block),
                existing => *existing = PropertyValue::Blocks(vec![block]),
            },
            None => self
                .properties
                .push((name, PropertyValue::Blocks(vec![block]))),
        }
        self
    }

    pub fn depends_on(mut self, target: &ResourceAddress) -> Self {
        self.depends_on.insert(target.clone());
        self
    }

    /// Reference to one of this node's attributes.
    pub fn attr(&self, attribute: impl Into<String>) -> PropertyValue {
        PropertyValue::reference(&self.address, attribute)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Nodes this one needs first: explicit edges plus reference targets.
    pub fn dependencies(&self) -> BTreeSet<&ResourceAddress> {
        let mut deps: BTreeSet<&ResourceAddress> = self.depends_on.iter().collect();
        for (_, value) in &self.properties {
            for r in value.references() {
                deps.insert(&r.target);
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_block_appends() {
        let node = ResourceNode::new("azurerm_site_recovery_replicated_vm", "test")
            .with_block("network_interface", Block::new().with("target_subnet_name", "a"))
            .with_block("network_interface", Block::new().with("target_subnet_name", "b"));

        match node.get("network_interface") {
            Some(PropertyValue::Blocks(blocks)) => assert_eq!(blocks.len(), 2),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_dependencies_include_nested_references() {
        let rg = ResourceNode::new("azurerm_resource_group", "test");
        let nic = ResourceNode::new("azurerm_network_interface", "test");
        let mapping = ResourceNode::new("azurerm_site_recovery_network_mapping", "test");

        let node = ResourceNode::new("azurerm_site_recovery_replicated_vm", "test")
            .with("resource_group_name", rg.attr("name"))
            .with_block(
                "network_interface",
                Block::new().with("source_network_interface_id", nic.attr("id")),
            )
            .depends_on(&mapping.address);

        let deps = node.dependencies();
        assert_eq!(deps.len(), 3);
        assert!(deps.contains(&rg.address));
        assert!(deps.contains(&nic.address));
        assert!(deps.contains(&mapping.address));
    }

    #[test]
    fn test_with_replaces_existing() {
        let node = ResourceNode::new("azurerm_resource_group", "test")
            .with("location", "westeurope")
            .with("location", "northeurope");
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.get("location"), Some(&PropertyValue::text("northeurope")));
    }
}
