//! Topology graphs and realization ordering.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use sitecheck_types::ResourceAddress;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::node::ResourceNode;

/// The full declared set of resources for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Provider blocks emitted ahead of the resources.
    pub providers: Vec<String>,

    nodes: Vec<ResourceNode>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.providers.push(provider.into());
        self
    }

    /// Declare a node. Addresses must be unique.
    pub fn add(&mut self, node: ResourceNode) -> TopologyResult<()> {
        if self.get(&node.address).is_some() {
            return Err(TopologyError::DuplicateNode(node.address));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| &n.address == address)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every reference and `depends_on` entry names a declared
    /// node and that the dependency relation is acyclic.
    pub fn validate(&self) -> TopologyResult<()> {
        self.realization_order().map(|_| ())
    }

    /// Order in which nodes can be realized: every node comes after all of
    /// its dependencies. Destroy runs in the reverse order.
    pub fn realization_order(&self) -> TopologyResult<Vec<&ResourceNode>> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let mut indices: HashMap<&ResourceAddress, NodeIndex> = HashMap::new();

        for (i, node) in self.nodes.iter().enumerate() {
            indices.insert(&node.address, graph.add_node(i));
        }

        for node in &self.nodes {
            let to = indices[&node.address];

            for target in &node.depends_on {
                let from = indices
                    .get(target)
                    .ok_or_else(|| TopologyError::UnknownDependency {
                        node: node.address.clone(),
                        target: target.clone(),
                    })?;
                graph.update_edge(*from, to, ());
            }

            for (property, value) in &node.properties {
                for reference in value.references() {
                    let from = indices.get(&reference.target).ok_or_else(|| {
                        TopologyError::UnresolvedReference {
                            node: node.address.clone(),
                            property: property.clone(),
                            target: reference.target.clone(),
                        }
                    })?;
                    graph.update_edge(*from, to, ());
                }
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| TopologyError::Cycle {
            node: self.nodes[graph[cycle.node_id()]].address.clone(),
        })?;

        debug!(nodes = sorted.len(), edges = graph.edge_count(), "Topology ordered");

        Ok(sorted.into_iter().map(|ix| &self.nodes[graph[ix]]).collect())
    }
}
