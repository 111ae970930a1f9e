//! Error types for sitecheck-topology crate.
//!
//! Every variant is a configuration error: it is raised while validating or
//! rendering a topology, before anything is handed to the provisioning
//! engine.

use sitecheck_types::ResourceAddress;
use thiserror::Error;

/// Errors raised while declaring, validating or rendering a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Two nodes share an address.
    #[error("duplicate resource {0}")]
    DuplicateNode(ResourceAddress),

    /// A property refers to a node that is not declared.
    #[error("{node}: property {property:?} references undeclared resource {target}")]
    UnresolvedReference {
        node: ResourceAddress,
        property: String,
        target: ResourceAddress,
    },

    /// A `depends_on` entry names a node that is not declared.
    #[error("{node}: depends_on references undeclared resource {target}")]
    UnknownDependency {
        node: ResourceAddress,
        target: ResourceAddress,
    },

    /// The dependency relation has a cycle through this node.
    #[error("dependency cycle through {node}")]
    Cycle { node: ResourceAddress },

    /// A template placeholder has no matching parameter.
    #[error("{node}: property {property:?} has unresolved placeholder {{{placeholder}}}")]
    UnresolvedPlaceholder {
        node: ResourceAddress,
        property: String,
        placeholder: String,
    },

    /// A template has an opening brace with no closing brace.
    #[error("{node}: property {property:?} has malformed template {template:?}")]
    MalformedTemplate {
        node: ResourceAddress,
        property: String,
        template: String,
    },

    /// A rendering parameter is empty.
    #[error("parameter {0} must not be empty")]
    EmptyParameter(&'static str),
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
