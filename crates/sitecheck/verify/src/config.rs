//! Verification configuration.

use serde::{Deserialize, Serialize};
use sitecheck_types::KeySchema;
use std::time::Duration;

/// Configuration shared by the existence and destroy checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Upper bound on a single remote lookup.
    pub lookup_timeout: Duration,

    /// Extra attempts the destroy check makes when a lookup errors.
    ///
    /// With the default of `0`, a lookup error counts as "destroyed" right
    /// away. With retries, the error still counts as destroyed once the
    /// budget is spent, but a transient outage gets a chance to clear and a
    /// leaked resource to show up as found.
    pub destroy_lookup_retries: u32,

    /// Delay between destroy lookup retries.
    pub retry_delay: Duration,

    /// Attributes the compound remote key is read from.
    pub key_schema: KeySchema,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(60),
            destroy_lookup_retries: 0,
            retry_delay: Duration::from_secs(5),
            key_schema: KeySchema::replicated_vm(),
        }
    }
}

impl VerifyConfig {
    /// Destroy check retries transport errors before giving up.
    pub fn with_destroy_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.destroy_lookup_retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_key_schema(mut self, schema: KeySchema) -> Self {
        self.key_schema = schema;
        self
    }
}
