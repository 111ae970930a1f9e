//! Full scenario lifecycle against the simulated provisioner.

use async_trait::async_trait;
use sitecheck_harness::{
    HarnessConfig, HarnessError, InMemoryRemote, ProvisionError, Provisioner, Scenario,
    ScenarioRunner, SimulatedProvisioner,
};
use sitecheck_topology::recovery::{self, recovery_topology, replicated_vm_address};
use sitecheck_topology::{
    render, RenderedTopology, ResourceNode, Topology, TopologyError, TopologyParams,
};
use sitecheck_types::{AttributeStore, CheckKind, ResourceAddress, StateSnapshot};
use sitecheck_verify::{
    match_attribute, CancellationToken, KeyPattern, Verifier, VerifyConfig, VerifyError,
};
use std::sync::Arc;

struct Fixture {
    remote: Arc<InMemoryRemote>,
    provisioner: Arc<SimulatedProvisioner>,
    runner: ScenarioRunner,
}

fn fixture() -> Fixture {
    let remote = Arc::new(InMemoryRemote::new());
    let provisioner = Arc::new(SimulatedProvisioner::new(remote.clone()));
    let verifier = Arc::new(Verifier::new(remote.clone(), VerifyConfig::default()));
    let runner = ScenarioRunner::new(provisioner.clone(), verifier);
    Fixture {
        remote,
        provisioner,
        runner,
    }
}

fn config(suffix: u64) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.topology = TopologyParams::new("westeurope", "northeurope", suffix);
    config
}

#[tokio::test]
async fn test_replicated_vm_lifecycle_step_by_step() {
    let fx = fixture();
    let verifier = Verifier::new(fx.remote.clone(), VerifyConfig::default());
    let cancel = CancellationToken::new();
    let params = TopologyParams::new("westeurope", "northeurope", 42);

    let rendered = render(&recovery_topology().unwrap(), &params).unwrap();
    assert!(rendered.text().contains("\"snet-42_2\""));

    let snapshot = fx.provisioner.apply(&rendered).await.unwrap();
    let address = replicated_vm_address();

    assert_eq!(verifier.verify_exists(&snapshot, &address, &cancel).await, Ok(()));

    let pattern: KeyPattern = "network_interface.*.target_subnet_name".parse().unwrap();
    let state = snapshot.get(&address).unwrap();
    assert_eq!(match_attribute(&state.attributes, &pattern, "snet-42_2"), Ok(()));

    fx.provisioner.destroy(&rendered).await.unwrap();
    assert_eq!(
        verifier
            .verify_destroyed(&snapshot, recovery::REPLICATED_VM, &cancel)
            .await,
        Ok(())
    );
    assert!(fx.remote.is_empty());
}

#[tokio::test]
async fn test_replicated_vm_scenario_passes() {
    let fx = fixture();
    let scenario = Scenario::replicated_vm(&config(42)).unwrap();

    let report = fx
        .runner
        .run(&scenario, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.passed(), "{report}");
    let kinds: Vec<CheckKind> = report.checks.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CheckKind::Exists,
            CheckKind::AttributeMatch,
            CheckKind::Import,
            CheckKind::Destroyed
        ]
    );
    assert!(fx.remote.is_empty());
}

#[tokio::test]
async fn test_leaked_item_fails_destroy_check() {
    let fx = fixture();
    fx.provisioner.leak(replicated_vm_address());
    let scenario = Scenario::replicated_vm(&config(5)).unwrap();

    let report = fx
        .runner
        .run(&scenario, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.passed());
    let destroyed = report.check(CheckKind::Destroyed).unwrap();
    assert!(!destroyed.passed);
    let message = destroyed.message.as_deref().unwrap();
    assert!(message.contains("still exists"), "{message}");
    assert!(message.contains("repl-5"), "{message}");
}

#[tokio::test]
async fn test_destroy_check_passes_when_remote_unreachable() {
    let fx = fixture();
    let verifier = Verifier::new(fx.remote.clone(), VerifyConfig::default());
    fx.provisioner.leak(replicated_vm_address());

    let rendered = render(
        &recovery_topology().unwrap(),
        &TopologyParams::new("westeurope", "northeurope", 9),
    )
    .unwrap();
    let snapshot = fx.provisioner.apply(&rendered).await.unwrap();
    fx.provisioner.destroy(&rendered).await.unwrap();

    // The item leaked, but an unreachable control plane counts as destroyed.
    fx.remote.set_unreachable(true);
    let verdict = verifier
        .verify_destroyed(&snapshot, recovery::REPLICATED_VM, &CancellationToken::new())
        .await;
    assert_eq!(verdict, Ok(()));

    fx.remote.set_unreachable(false);
    let verdict = verifier
        .verify_destroyed(&snapshot, recovery::REPLICATED_VM, &CancellationToken::new())
        .await;
    assert!(matches!(verdict, Err(VerifyError::ResourceStillExists { .. })));
}

#[tokio::test]
async fn test_import_drift_fails_but_still_tears_down() {
    let fx = fixture();
    fx.provisioner
        .drift(replicated_vm_address(), "recovery_vault_name", "other-vault");
    let scenario = Scenario::replicated_vm(&config(11)).unwrap();

    let report = fx
        .runner
        .run(&scenario, &CancellationToken::new())
        .await
        .unwrap();

    let import = report.check(CheckKind::Import).unwrap();
    assert!(!import.passed);
    assert!(import.message.as_deref().unwrap().contains("recovery_vault_name"));
    assert!(report.check(CheckKind::Destroyed).unwrap().passed);
    assert!(fx.remote.is_empty());
}

#[tokio::test]
async fn test_ignored_drift_passes() {
    let fx = fixture();
    fx.provisioner
        .drift(replicated_vm_address(), "source_vm_id", "/elsewhere");
    let mut config = config(12);
    config.scenario.import_ignore = vec!["source_vm_id".to_string()];

    let report = fx
        .runner
        .run(&Scenario::replicated_vm(&config).unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.passed(), "{report}");
}

#[tokio::test]
async fn test_cycle_fails_before_apply() {
    let fx = fixture();
    let a = ResourceNode::new("azurerm_resource_group", "a");
    let b = ResourceNode::new("azurerm_resource_group", "b").depends_on(&a.address);
    let a = a.depends_on(&b.address);

    let mut topology = Topology::new();
    topology.add(a).unwrap();
    topology.add(b).unwrap();
    let scenario = Scenario::new("cyclic", topology, TopologyParams::default());

    let result = fx.runner.run(&scenario, &CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarnessError::Configuration(TopologyError::Cycle { .. }))
    ));
    assert_eq!(fx.provisioner.realized(), 0);
}

#[tokio::test]
async fn test_apply_failure_is_an_error() {
    let fx = fixture();
    fx.provisioner.fail_next_apply();

    let result = fx
        .runner
        .run(&Scenario::replicated_vm(&config(1)).unwrap(), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(HarnessError::Provision { stage: "apply", .. })
    ));
    // The half that was created before the failure is torn down.
    assert_eq!(fx.provisioner.realized(), 0);
}

#[tokio::test]
async fn test_cancelled_before_apply() {
    let fx = fixture();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fx
        .runner
        .run(&Scenario::replicated_vm(&config(3)).unwrap(), &cancel)
        .await;

    assert!(matches!(result, Err(HarnessError::Cancelled { stage: "apply" })));
    assert_eq!(fx.provisioner.realized(), 0);
    assert!(fx.remote.is_empty());
}

/// Cancels the run as soon as apply returns.
struct CancelAfterApply {
    inner: Arc<SimulatedProvisioner>,
    cancel: CancellationToken,
}

#[async_trait]
impl Provisioner for CancelAfterApply {
    async fn apply(&self, topology: &RenderedTopology) -> Result<StateSnapshot, ProvisionError> {
        let applied = self.inner.apply(topology).await;
        self.cancel.cancel();
        applied
    }

    async fn destroy(&self, topology: &RenderedTopology) -> Result<(), ProvisionError> {
        self.inner.destroy(topology).await
    }

    async fn import(
        &self,
        address: &ResourceAddress,
        id: &str,
    ) -> Result<AttributeStore, ProvisionError> {
        self.inner.import(address, id).await
    }
}

#[tokio::test]
async fn test_cancelled_after_apply_fails_checks_and_cleans_up() {
    let fx = fixture();
    let cancel = CancellationToken::new();
    let provisioner = Arc::new(CancelAfterApply {
        inner: fx.provisioner.clone(),
        cancel: cancel.clone(),
    });
    let verifier = Arc::new(Verifier::new(fx.remote.clone(), VerifyConfig::default()));
    let runner = ScenarioRunner::new(provisioner, verifier);

    let report = runner
        .run(&Scenario::replicated_vm(&config(3)).unwrap(), &cancel)
        .await
        .unwrap();

    let exists = report.check(CheckKind::Exists).unwrap();
    assert!(!exists.passed);
    assert!(exists.message.as_deref().unwrap().contains("cancelled"));
    assert!(report.check(CheckKind::AttributeMatch).is_none());
    assert!(!report.check(CheckKind::Destroyed).unwrap().passed);
    assert_eq!(fx.provisioner.realized(), 0);
    assert!(fx.remote.is_empty());
}

#[tokio::test]
async fn test_run_all_keeps_input_order() {
    let fx = fixture();
    let runner = fx.runner.with_max_concurrent(2);
    let scenarios: Vec<Scenario> = [21, 22, 23]
        .into_iter()
        .map(|suffix| Scenario::replicated_vm(&config(suffix)).unwrap())
        .collect();

    let reports = runner.run_all(&scenarios, &CancellationToken::new()).await;

    let names: Vec<String> = reports
        .into_iter()
        .map(|r| {
            let report = r.unwrap();
            assert!(report.passed(), "{report}");
            report.scenario
        })
        .collect();
    assert_eq!(
        names,
        vec!["replicated-vm-21", "replicated-vm-22", "replicated-vm-23"]
    );
    assert!(fx.remote.is_empty());
}
