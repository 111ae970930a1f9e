//! Scenario execution.
//!
//! Within a scenario every step is sequential: render, apply, checks in
//! declaration order, destroy, destroy check. The first failing check ends
//! the check phase; teardown still runs so a failed scenario does not leak
//! infrastructure. That includes an apply that failed or was cancelled part
//! way, since the engine may already have created resources.
//!
//! Cancellation interrupts apply, lookups and imports. Teardown ignores it
//! and is bounded by [`ScenarioOptions::teardown_timeout`] instead.
//!
//! Separate scenarios share nothing but the provisioner and lookup and may
//! run concurrently through [`ScenarioRunner::run_all`].

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use sitecheck_topology::{render, RenderedTopology};
use sitecheck_types::{CheckKind, CheckReport, ResourceAddress, StateSnapshot};
use sitecheck_verify::{match_attribute, verify_import, CancellationToken, Verifier, VerifyError};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ScenarioOptions;
use crate::error::{HarnessError, HarnessResult};
use crate::provisioner::{ProvisionError, Provisioner};
use crate::scenario::{Check, Scenario};

/// Everything one scenario run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub scenario: String,
    /// Check outcomes in execution order.
    pub checks: Vec<CheckReport>,
}

impl ScenarioReport {
    fn new(scenario: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            scenario: scenario.to_string(),
            checks: Vec::new(),
        }
    }

    /// All checks passed. A scenario with no checks passes.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckReport> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn check(&self, kind: CheckKind) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.kind == kind)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(f, "{status} {} ({})", self.scenario, self.run_id)?;
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        Ok(())
    }
}

/// Runs scenarios against one provisioner and one verifier.
pub struct ScenarioRunner {
    provisioner: Arc<dyn Provisioner>,
    verifier: Arc<Verifier>,
    max_concurrent: usize,
    teardown_timeout: Duration,
}

impl ScenarioRunner {
    /// Runner with default [`ScenarioOptions`].
    pub fn new(provisioner: Arc<dyn Provisioner>, verifier: Arc<Verifier>) -> Self {
        let defaults = ScenarioOptions::default();
        Self {
            provisioner,
            verifier,
            max_concurrent: defaults.max_concurrent,
            teardown_timeout: defaults.teardown_timeout,
        }
    }

    /// Take concurrency and teardown bounds from `options`.
    pub fn with_options(self, options: &ScenarioOptions) -> Self {
        self.with_max_concurrent(options.max_concurrent)
            .with_teardown_timeout(options.teardown_timeout)
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run one scenario to completion.
    ///
    /// Returns an error only when the scenario could not get as far as its
    /// checks: the topology does not render, or apply fails or is
    /// cancelled. In the latter cases teardown has already been attempted.
    /// Check failures, including a failed teardown, are recorded in the
    /// report.
    #[instrument(skip(self, scenario, cancel), fields(scenario = %scenario.name, provisioner = self.provisioner.name()))]
    pub async fn run(
        &self,
        scenario: &Scenario,
        cancel: &CancellationToken,
    ) -> HarnessResult<ScenarioReport> {
        let rendered = render(&scenario.topology, &scenario.params)?;
        let mut report = ScenarioReport::new(&scenario.name);

        let applied = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HarnessError::Cancelled { stage: "apply" }),
            applied = self.provisioner.apply(&rendered) => {
                applied.map_err(|source| HarnessError::Provision { stage: "apply", source })
            }
        };
        let snapshot = match applied {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Apply did not complete, tearing down");
                if let Err(teardown) = self.teardown(&rendered).await {
                    warn!(error = %teardown, "Teardown after incomplete apply failed");
                }
                return Err(e);
            }
        };
        info!(resources = snapshot.len(), serial = snapshot.serial, "Topology applied");

        for check in &scenario.checks {
            let outcome = self.run_check(check, &snapshot, cancel).await;
            let failed = !outcome.passed;
            report.checks.push(outcome);
            if failed {
                warn!(check = %check.kind(), "Check failed, skipping remaining checks");
                break;
            }
        }

        if let Err(e) = self.teardown(&rendered).await {
            warn!(error = %e, "Destroy failed");
            report.checks.push(CheckReport::fail(
                CheckKind::Destroyed,
                scenario.tracked_type.as_deref().unwrap_or(&scenario.name),
                e.to_string(),
                0,
            ));
            return Ok(report);
        }

        if let Some(tracked) = &scenario.tracked_type {
            // Keys come from the last applied state; the post-destroy state
            // no longer records them.
            let start = Instant::now();
            let verdict = self.verifier.verify_destroyed(&snapshot, tracked, cancel).await;
            report
                .checks
                .push(to_report(CheckKind::Destroyed, tracked.clone(), verdict, start));
        }

        info!(passed = report.passed(), checks = report.checks.len(), "Scenario finished");
        Ok(report)
    }

    /// Run scenarios concurrently, at most `max_concurrent` at a time.
    /// Results are in input order.
    pub async fn run_all(
        &self,
        scenarios: &[Scenario],
        cancel: &CancellationToken,
    ) -> Vec<HarnessResult<ScenarioReport>> {
        stream::iter(scenarios)
            .map(|scenario| self.run(scenario, cancel))
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Destroy `rendered`, bounded by the teardown timeout.
    async fn teardown(&self, rendered: &RenderedTopology) -> HarnessResult<()> {
        match tokio::time::timeout(self.teardown_timeout, self.provisioner.destroy(rendered)).await {
            Ok(result) => result.map_err(|source| HarnessError::Provision {
                stage: "destroy",
                source,
            }),
            Err(_) => Err(HarnessError::Provision {
                stage: "destroy",
                source: ProvisionError::new(format!(
                    "timed out after {}s",
                    self.teardown_timeout.as_secs_f64()
                )),
            }),
        }
    }

    async fn run_check(
        &self,
        check: &Check,
        snapshot: &StateSnapshot,
        cancel: &CancellationToken,
    ) -> CheckReport {
        let start = Instant::now();
        let verdict = match check {
            Check::Exists(address) => self
                .verifier
                .verify_exists(snapshot, address, cancel)
                .await
                .map_err(|e| e.to_string()),
            Check::AttributeMatches {
                address,
                pattern,
                expected,
            } => match snapshot.get(address) {
                Some(state) => match_attribute(&state.attributes, pattern, expected),
                None => Err(VerifyError::NotInState(address.clone())),
            }
            .map_err(|e| e.to_string()),
            Check::Import { address, ignore } => self
                .check_import(snapshot, address, ignore, cancel)
                .await
                .map_err(|e| e.to_string()),
        };
        to_report(check.kind(), check.subject(), verdict, start)
    }

    async fn check_import(
        &self,
        snapshot: &StateSnapshot,
        address: &ResourceAddress,
        ignore: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), ImportFailure> {
        let state = snapshot
            .get(address)
            .ok_or_else(|| VerifyError::NotInState(address.clone()))?;

        let imported = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VerifyError::Cancelled {
                operation: "import".to_string(),
            }.into()),
            imported = self.provisioner.import(address, &state.id) => imported,
        };

        verify_import(address, &state.attributes, &imported?, ignore)?;
        Ok(())
    }
}

/// Import checks can fail on the provisioning side as well as on the
/// comparison.
#[derive(Debug, Error)]
enum ImportFailure {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("import failed: {0}")]
    Provision(#[from] ProvisionError),
}

fn to_report<E: fmt::Display>(
    kind: CheckKind,
    subject: String,
    verdict: Result<(), E>,
    start: Instant,
) -> CheckReport {
    let latency_ms = start.elapsed().as_millis() as u64;
    match verdict {
        Ok(()) => CheckReport::pass(kind, subject, latency_ms),
        Err(e) => CheckReport::fail(kind, subject, e.to_string(), latency_ms),
    }
}
