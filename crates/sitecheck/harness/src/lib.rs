//! # Sitecheck Harness - Scenario Orchestration
//!
//! Drives a site recovery topology through its lifecycle and records what
//! the verifiers conclude at each step:
//!
//! 1. render the [`Scenario`]'s topology (a cycle or unresolved reference
//!    fails here, before anything is applied)
//! 2. apply it through a [`Provisioner`]
//! 3. run the scenario's checks in order against the applied snapshot
//! 4. destroy it, then verify no tracked resource remains remotely
//!
//! Teardown also runs when apply fails or is cancelled part way.
//!
//! [`SimulatedProvisioner`] and [`InMemoryRemote`] stand in for the
//! provisioning engine and control plane, so a scenario can be rehearsed
//! without touching a subscription.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sitecheck_harness::{HarnessConfig, Provisioner, Scenario, ScenarioRunner};
//! use sitecheck_verify::{CancellationToken, Verifier};
//!
//! # async fn example(provisioner: Arc<dyn Provisioner>) -> sitecheck_harness::HarnessResult<()> {
//! let config = HarnessConfig::load(None)?;
//! let verifier = Verifier::new(config.remote_lookup()?, config.verify.clone());
//! let runner = ScenarioRunner::new(provisioner, Arc::new(verifier)).with_options(&config.scenario);
//!
//! let scenarios = vec![Scenario::replicated_vm(&config)?];
//! for report in runner.run_all(&scenarios, &CancellationToken::new()).await {
//!     println!("{}", report?);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod provisioner;
pub mod runner;
pub mod scenario;
pub mod simulated;
pub mod telemetry;

pub use config::{HarnessConfig, ScenarioOptions};
pub use error::{HarnessError, HarnessResult};
pub use provisioner::{ProvisionError, Provisioner};
pub use runner::{ScenarioReport, ScenarioRunner};
pub use scenario::{Check, Scenario};
pub use simulated::{InMemoryRemote, SimulatedProvisioner};
pub use telemetry::init_tracing;
