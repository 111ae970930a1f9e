//! # Sitecheck Topology - Resource Graph Declaration
//!
//! Declares the resources a verification scenario provisions, the order they
//! have to be realized in, and renders them into the configuration text the
//! provisioning engine consumes.
//!
//! ## Key Components
//!
//! - [`ResourceNode`]: one declared resource with its properties and explicit
//!   `depends_on` edges
//! - [`Topology`]: the full graph; validates references and rejects cycles
//! - [`TopologyParams`]: typed rendering options (locations, unique suffix)
//! - [`render`]: graph-to-text rendering with placeholder substitution
//! - [`recovery`]: the site recovery replicated-VM topology
//!
//! ## Ordering
//!
//! Edges come from two places: references between properties
//! (`azurerm_site_recovery_fabric.test1.name`) and explicit `depends_on`
//! sets. The explicit edges matter when the remote API requires a resource
//! to exist without any property referring to it, which is the case for the
//! container and network mappings a replicated VM needs.
//!
//! ## Example
//!
//! ```rust
//! use sitecheck_topology::{recovery, render, TopologyParams};
//!
//! let params = TopologyParams::new("westeurope", "northeurope", 42);
//! let rendered = render(&recovery::recovery_topology().unwrap(), &params).unwrap();
//! assert!(rendered.text().contains("snet-42_2"));
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod graph;
pub mod node;
pub mod params;
pub mod recovery;
pub mod render;
mod template;

pub use error::{TopologyError, TopologyResult};
pub use graph::Topology;
pub use node::{Block, PropertyValue, Reference, ResourceNode};
pub use params::TopologyParams;
pub use render::{render, RenderedTopology};
