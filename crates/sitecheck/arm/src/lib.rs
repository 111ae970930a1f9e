//! # Sitecheck ARM - Remote Lookup Adapter
//!
//! Implements [`sitecheck_verify::RemoteLookup`] against the resource
//! management REST API. A replicated item is read with a single `GET` on
//!
//! ```text
//! {endpoint}/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.RecoveryServices
//!     /vaults/{vault}/replicationFabrics/{fabric}
//!     /replicationProtectionContainers/{container}/replicationMigrationItems/{name}
//! ```
//!
//! and the answer is mapped as follows: `404` is not-found, any `2xx` is
//! found with the response body as representation, everything else
//! (including transport failures and timeouts) is a lookup error.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod client;
pub mod config;
pub mod error;
pub mod token;

pub use client::{classify, ArmLookup};
pub use config::ArmConfig;
pub use error::{ArmError, ArmResult};
pub use token::{EnvToken, StaticToken, TokenProvider};
