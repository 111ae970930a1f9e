//! # Sitecheck Verify - State Verification Protocol
//!
//! Checks that what a provisioning run recorded locally agrees with what the
//! remote control plane actually holds.
//!
//! ## Checks
//!
//! - [`Verifier::verify_exists`]: a resource recorded in state must have a
//!   live remote counterpart. A remote not-found is a failure, not a race:
//!   the check only runs after the provisioning engine reports completion.
//! - [`Verifier::verify_destroyed`]: after teardown, no remote resource of
//!   the tracked type may remain reachable. A lookup *error* counts as
//!   destroyed; see [`VerifyConfig::destroy_lookup_retries`].
//! - [`match_attribute`]: finds a value inside an indexed collection whose
//!   index is not known ahead of time, using a [`KeyPattern`].
//! - [`verify_import`]: state read back through an import must equal the
//!   applied state.
//!
//! ## Dependencies
//!
//! Every remote call goes through a [`RemoteLookup`] handed to the
//! [`Verifier`] at construction, and every blocking call observes the
//! [`CancellationToken`] passed to it. Nothing is read from global state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sitecheck_types::{ResourceAddress, StateSnapshot};
//! use sitecheck_verify::{CancellationToken, RemoteLookup, Verifier, VerifyConfig};
//!
//! # async fn example(lookup: Arc<dyn RemoteLookup>, snapshot: StateSnapshot) {
//! let verifier = Verifier::new(lookup, VerifyConfig::default());
//! let cancel = CancellationToken::new();
//! let address: ResourceAddress = "azurerm_site_recovery_replicated_vm.test".parse().unwrap();
//!
//! match verifier.verify_exists(&snapshot, &address, &cancel).await {
//!     Ok(()) => println!("{address} exists"),
//!     Err(e) => println!("{address}: {e}"),
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod import;
pub mod lookup;
pub mod pattern;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::VerifyConfig;
pub use error::{Verdict, VerifyError, VerifyResult};
pub use import::verify_import;
pub use lookup::{LookupError, LookupOutcome, RemoteLookup};
pub use pattern::{match_attribute, KeyPattern};
pub use verifier::Verifier;

pub use tokio_util::sync::CancellationToken;
