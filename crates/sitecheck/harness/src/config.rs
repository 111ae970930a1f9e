//! Harness configuration.
//!
//! Loaded from a TOML file when one exists, then overridden from the
//! environment:
//!
//! | variable                  | field                           |
//! |---------------------------|---------------------------------|
//! | `ARM_TEST_LOCATION`       | `topology.primary_location`     |
//! | `ARM_TEST_LOCATION_ALT`   | `topology.secondary_location`   |
//! | `SITECHECK_UNIQUE_SUFFIX` | `topology.unique_suffix`        |
//! | `ARM_SUBSCRIPTION_ID`     | `arm.subscription_id`           |
//! | `ARM_ENDPOINT`            | `arm.endpoint`                  |

use serde::{Deserialize, Serialize};
use sitecheck_arm::{ArmConfig, ArmLookup, EnvToken};
use sitecheck_topology::TopologyParams;
use sitecheck_verify::{RemoteLookup, VerifyConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{HarnessError, HarnessResult};

/// File read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sitecheck.toml";

/// Largest generated unique suffix, exclusive.
const SUFFIX_RANGE: u128 = 10_000_000;

/// Complete harness configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Rendering parameters.
    pub topology: TopologyParams,

    /// Verifier behavior.
    pub verify: VerifyConfig,

    /// Scenario options.
    pub scenario: ScenarioOptions,

    /// Remote lookup endpoint.
    pub arm: ArmConfig,
}

/// Options applied to every scenario built from this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    /// Re-import the tracked resource after apply and compare state.
    pub verify_import: bool,

    /// Attributes excluded from the import comparison.
    pub import_ignore: Vec<String>,

    /// Upper bound on scenarios running at once.
    pub max_concurrent: usize,

    /// Upper bound on a destroy. Teardown is not interrupted by
    /// cancellation, so a cancelled run still cleans up within this bound.
    pub teardown_timeout: Duration,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            verify_import: true,
            import_ignore: Vec::new(),
            max_concurrent: 4,
            teardown_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl HarnessConfig {
    /// Load from `path` (or [`DEFAULT_CONFIG_FILE`]), falling back to
    /// defaults when the file does not exist, then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> HarnessResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = if path.exists() {
            debug!(path = %path.display(), "Loading harness configuration");
            let contents = std::fs::read_to_string(&path)?;
            Self::from_toml(&contents)?
        } else {
            Self::default()
        };

        let config = config.with_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> HarnessResult<Self> {
        toml::from_str(contents).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Apply overrides from a variable source. Empty values are ignored.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(location) = var("ARM_TEST_LOCATION") {
            self.topology.primary_location = location;
        }
        if let Some(location) = var("ARM_TEST_LOCATION_ALT") {
            self.topology.secondary_location = location;
        }
        if let Some(suffix) = var("SITECHECK_UNIQUE_SUFFIX") {
            self.topology.unique_suffix = suffix.trim().parse().map_err(|_| {
                HarnessError::Config(format!("SITECHECK_UNIQUE_SUFFIX={suffix:?} is not an integer"))
            })?;
        }
        self.arm = self.arm.with_overrides(&var);
        Ok(self)
    }

    /// Replace the unique suffix with a fresh random one.
    pub fn with_random_suffix(mut self) -> Self {
        self.topology.unique_suffix = (Uuid::new_v4().as_u128() % SUFFIX_RANGE) as u64;
        self
    }

    pub fn validate(&self) -> HarnessResult<()> {
        self.topology.validate()?;
        if self.scenario.max_concurrent == 0 {
            return Err(HarnessError::Config("scenario.max_concurrent must be at least 1".into()));
        }
        if self.scenario.teardown_timeout.is_zero() {
            return Err(HarnessError::Config("scenario.teardown_timeout must be positive".into()));
        }
        Ok(())
    }

    /// Lookup adapter for the configured endpoint, authenticated with the
    /// token in `ARM_ACCESS_TOKEN`.
    pub fn remote_lookup(&self) -> HarnessResult<Arc<dyn RemoteLookup>> {
        let lookup = ArmLookup::new(self.arm.clone(), Arc::new(EnvToken::default()))?;
        Ok(Arc::new(lookup))
    }
}
