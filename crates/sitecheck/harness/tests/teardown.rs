//! Teardown and cancellation around the provisioning engine.

use async_trait::async_trait;
use sitecheck_harness::{
    HarnessError, InMemoryRemote, ProvisionError, Provisioner, Scenario, ScenarioOptions,
    ScenarioRunner,
};
use sitecheck_topology::{RenderedTopology, Topology, TopologyParams};
use sitecheck_types::{AttributeStore, CheckKind, ResourceAddress, ResourceState, StateSnapshot};
use sitecheck_verify::{CancellationToken, Verifier, VerifyConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum ApplyBehavior {
    Hang,
    Fail(&'static str),
    Succeed(Duration),
}

struct ScriptedProvisioner {
    apply: ApplyBehavior,
    destroy_hangs: bool,
    destroys: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedProvisioner {
    fn new(apply: ApplyBehavior) -> Self {
        Self {
            apply,
            destroy_hangs: false,
            destroys: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn with_hanging_destroy(mut self) -> Self {
        self.destroy_hangs = true;
        self
    }

    fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provisioner for ScriptedProvisioner {
    async fn apply(&self, _topology: &RenderedTopology) -> Result<StateSnapshot, ProvisionError> {
        match &self.apply {
            ApplyBehavior::Hang => futures::future::pending().await,
            ApplyBehavior::Fail(message) => Err(ProvisionError::new(*message)),
            ApplyBehavior::Succeed(delay) => {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(*delay).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(StateSnapshot::new(1, Vec::<ResourceState>::new()))
            }
        }
    }

    async fn destroy(&self, _topology: &RenderedTopology) -> Result<(), ProvisionError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.destroy_hangs {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn import(
        &self,
        address: &ResourceAddress,
        _id: &str,
    ) -> Result<AttributeStore, ProvisionError> {
        Err(ProvisionError::new(format!("{address} cannot be imported")))
    }
}

fn runner(provisioner: Arc<ScriptedProvisioner>) -> ScenarioRunner {
    let verifier = Verifier::new(Arc::new(InMemoryRemote::new()), VerifyConfig::default());
    ScenarioRunner::new(provisioner, Arc::new(verifier))
}

fn scenario(name: &str) -> Scenario {
    Scenario::new(name, Topology::new(), TopologyParams::default())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_hanging_apply() {
    let provisioner = Arc::new(ScriptedProvisioner::new(ApplyBehavior::Hang));
    let runner = runner(provisioner.clone());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(2), runner.run(&scenario("hang"), &cancel))
        .await
        .expect("run must return once cancelled");

    assert!(matches!(result, Err(HarnessError::Cancelled { stage: "apply" })));
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_teardown_is_bounded() {
    let provisioner = Arc::new(ScriptedProvisioner::new(ApplyBehavior::Hang).with_hanging_destroy());
    let runner = runner(provisioner.clone()).with_teardown_timeout(Duration::from_secs(10));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(60), runner.run(&scenario("stuck"), &cancel))
        .await
        .expect("teardown must give up after its timeout");

    assert!(matches!(result, Err(HarnessError::Cancelled { stage: "apply" })));
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test]
async fn test_partial_apply_is_torn_down() {
    let provisioner = Arc::new(ScriptedProvisioner::new(ApplyBehavior::Fail(
        "created 12 of 20 resources, then failed",
    )));

    let result = runner(provisioner.clone())
        .run(&scenario("partial"), &CancellationToken::new())
        .await;

    match result {
        Err(HarnessError::Provision { stage, source }) => {
            assert_eq!(stage, "apply");
            assert!(source.message.contains("12 of 20"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(provisioner.destroys(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_destroy_fails_destroy_check() {
    let provisioner = Arc::new(
        ScriptedProvisioner::new(ApplyBehavior::Succeed(Duration::ZERO)).with_hanging_destroy(),
    );
    let runner = runner(provisioner).with_teardown_timeout(Duration::from_secs(10));

    let report = runner
        .run(&scenario("stuck").with_destroy_check("azurerm_site_recovery_replicated_vm"), &CancellationToken::new())
        .await
        .unwrap();

    let destroyed = report.check(CheckKind::Destroyed).unwrap();
    assert!(!destroyed.passed);
    let message = destroyed.message.as_deref().unwrap();
    assert!(message.contains("timed out after 10s"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_follows_options() {
    let provisioner = Arc::new(ScriptedProvisioner::new(ApplyBehavior::Succeed(
        Duration::from_millis(50),
    )));
    let options = ScenarioOptions {
        max_concurrent: 2,
        ..ScenarioOptions::default()
    };
    let runner = runner(provisioner.clone()).with_options(&options);
    assert_eq!(runner.max_concurrent(), 2);

    let scenarios: Vec<Scenario> = (0..5).map(|i| scenario(&format!("s{i}"))).collect();
    let reports = runner.run_all(&scenarios, &CancellationToken::new()).await;

    assert_eq!(reports.len(), 5);
    assert!(reports
        .iter()
        .all(|r| matches!(r, Ok(report) if report.passed())));
    assert_eq!(provisioner.peak(), 2);
    assert_eq!(provisioner.destroys(), 5);
}
