//! Property tests for concurrent scenario runs.

use proptest::prelude::*;
use sitecheck_harness::{HarnessConfig, InMemoryRemote, Scenario, ScenarioRunner, SimulatedProvisioner};
use sitecheck_topology::TopologyParams;
use sitecheck_verify::{CancellationToken, Verifier, VerifyConfig};
use std::sync::Arc;

fn scenario(suffix: u64) -> Scenario {
    let mut config = HarnessConfig::default();
    config.topology = TopologyParams::new("westeurope", "northeurope", suffix);
    Scenario::replicated_vm(&config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Reports come back in input order and every scenario cleans up after
    /// itself, whatever the concurrency bound.
    #[test]
    fn run_all_preserves_input_order(
        suffixes in prop::collection::btree_set(0u64..10_000_000, 1..6)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        max_concurrent in 1usize..4,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (names, remote_empty) = runtime.block_on(async {
            let remote = Arc::new(InMemoryRemote::new());
            let provisioner = Arc::new(SimulatedProvisioner::new(remote.clone()));
            let verifier = Arc::new(Verifier::new(remote.clone(), VerifyConfig::default()));
            let runner = ScenarioRunner::new(provisioner, verifier).with_max_concurrent(max_concurrent);

            let scenarios: Vec<Scenario> = suffixes.iter().map(|s| scenario(*s)).collect();
            let names: Vec<Option<String>> = runner
                .run_all(&scenarios, &CancellationToken::new())
                .await
                .into_iter()
                .map(|r| r.ok().filter(|report| report.passed()).map(|report| report.scenario))
                .collect();
            (names, remote.is_empty())
        });

        let expected: Vec<Option<String>> = suffixes
            .iter()
            .map(|s| Some(format!("replicated-vm-{s}")))
            .collect();
        prop_assert_eq!(names, expected);
        prop_assert!(remote_empty);
    }
}
