//! # Sitecheck Types - Core State Model
//!
//! Shared types for the sitecheck verification harness. These describe what a
//! provisioning run leaves behind, not how it got there:
//!
//! - [`AttributeStore`]: the flattened, string-keyed state of one resource
//!   instance after an apply
//! - [`StateSnapshot`]: every resource instance produced by one apply or
//!   destroy, addressed by [`ResourceAddress`]
//! - [`CompoundRemoteKey`]: the scoping identifiers needed to address one
//!   resource at the remote API, derived from an [`AttributeStore`] through a
//!   [`KeySchema`]
//! - [`CheckReport`]: the binary outcome of one verification check
//!
//! ## Flattened attributes
//!
//! Nested repeated blocks are flattened into indexed keys:
//!
//! ```text
//! network_interface.#                              = "1"
//! network_interface.0.source_network_interface_id  = "/subscriptions/.../vm-42"
//! network_interface.0.target_subnet_name           = "snet-42_2"
//! ```
//!
//! Index assignment is owned by the provisioning engine and does not have to
//! follow declaration order. [`AttributeStore::indexed_blocks`] exposes the
//! blocks of one collection in ascending index order; indices are
//! [`BlockIndex`] values, so an index too long for a machine integer still
//! orders correctly.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod address;
pub mod attributes;
pub mod error;
pub mod index;
pub mod key;
pub mod report;
pub mod snapshot;

pub use address::ResourceAddress;
pub use attributes::{AttributeStore, AttributeStoreBuilder, COUNT_SEGMENT};
pub use error::{TypesError, TypesResult};
pub use index::BlockIndex;
pub use key::{CompoundRemoteKey, KeySchema};
pub use report::{CheckKind, CheckReport};
pub use snapshot::{ResourceState, StateSnapshot};
