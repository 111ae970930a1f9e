//! Scenario definitions.

use sitecheck_topology::recovery::{self, expected_target_subnet, replicated_vm_address};
use sitecheck_topology::{Topology, TopologyParams};
use sitecheck_types::{CheckKind, ResourceAddress};
use sitecheck_verify::KeyPattern;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Attribute path of the replicated VM's failover subnet.
pub const TARGET_SUBNET_PATTERN: &str = "network_interface.*.target_subnet_name";

/// One post-apply check.
#[derive(Debug, Clone)]
pub enum Check {
    /// The resource has a live remote counterpart.
    Exists(ResourceAddress),

    /// The first entry of an indexed collection holds `expected`.
    AttributeMatches {
        address: ResourceAddress,
        pattern: KeyPattern,
        expected: String,
    },

    /// Importing the resource by id reproduces its applied state.
    Import {
        address: ResourceAddress,
        ignore: Vec<String>,
    },
}

impl Check {
    pub fn kind(&self) -> CheckKind {
        match self {
            Check::Exists(_) => CheckKind::Exists,
            Check::AttributeMatches { .. } => CheckKind::AttributeMatch,
            Check::Import { .. } => CheckKind::Import,
        }
    }

    /// What the check is about, for reports.
    pub fn subject(&self) -> String {
        match self {
            Check::Exists(address) | Check::Import { address, .. } => address.to_string(),
            Check::AttributeMatches {
                address, pattern, ..
            } => format!("{address} {pattern}"),
        }
    }
}

/// A topology, the checks to run after applying it, and the resource type
/// that must be gone after teardown.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub topology: Topology,
    pub params: TopologyParams,
    pub checks: Vec<Check>,
    /// Resource type scanned by the destroy check; `None` skips it.
    pub tracked_type: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, topology: Topology, params: TopologyParams) -> Self {
        Self {
            name: name.into(),
            topology,
            params,
            checks: Vec::new(),
            tracked_type: None,
        }
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_destroy_check(mut self, tracked_type: impl Into<String>) -> Self {
        self.tracked_type = Some(tracked_type.into());
        self
    }

    /// The replicated-VM scenario: the item exists, its network interface
    /// fails over into `snet-{suffix}_2`, an import reproduces its state,
    /// and no replicated item remains after teardown.
    pub fn replicated_vm(config: &HarnessConfig) -> HarnessResult<Self> {
        let params = config.topology.clone();
        let address = replicated_vm_address();
        let pattern: KeyPattern = TARGET_SUBNET_PATTERN
            .parse()
            .map_err(|e| HarnessError::Config(format!("{e}")))?;

        let mut scenario = Scenario::new(
            format!("replicated-vm-{}", params.unique_suffix),
            recovery::recovery_topology()?,
            params.clone(),
        )
        .with_check(Check::Exists(address.clone()))
        .with_check(Check::AttributeMatches {
            address: address.clone(),
            pattern,
            expected: expected_target_subnet(&params),
        });

        if config.scenario.verify_import {
            scenario = scenario.with_check(Check::Import {
                address,
                ignore: config.scenario.import_ignore.clone(),
            });
        }

        Ok(scenario.with_destroy_check(recovery::REPLICATED_VM))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replicated_vm_scenario() {
        let mut config = HarnessConfig::default();
        config.topology.unique_suffix = 42;

        let scenario = Scenario::replicated_vm(&config).unwrap();
        assert_eq!(scenario.name, "replicated-vm-42");
        assert_eq!(scenario.tracked_type.as_deref(), Some(recovery::REPLICATED_VM));

        let kinds: Vec<CheckKind> = scenario.checks.iter().map(Check::kind).collect();
        assert_eq!(
            kinds,
            vec![CheckKind::Exists, CheckKind::AttributeMatch, CheckKind::Import]
        );

        match &scenario.checks[1] {
            Check::AttributeMatches { expected, .. } => assert_eq!(expected, "snet-42_2"),
            other => panic!("unexpected check {other:?}"),
        }
    }

    #[test]
    fn test_import_check_optional() {
        let mut config = HarnessConfig::default();
        config.scenario.verify_import = false;

        let scenario = Scenario::replicated_vm(&config).unwrap();
        assert!(scenario.checks.iter().all(|c| c.kind() != CheckKind::Import));
    }

    #[test]
    fn test_subject() {
        let check = Check::AttributeMatches {
            address: replicated_vm_address(),
            pattern: TARGET_SUBNET_PATTERN.parse().unwrap(),
            expected: "x".into(),
        };
        assert_eq!(
            check.subject(),
            "azurerm_site_recovery_replicated_vm.test network_interface.*.target_subnet_name"
        );
    }
}
