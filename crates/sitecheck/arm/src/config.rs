//! ARM client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ArmError, ArmResult};

/// Public management endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version of the site recovery resource provider.
pub const DEFAULT_API_VERSION: &str = "2018-01-10";

/// Where and how replicated items are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Base URL of the management API. Tests point this at a local server.
    pub endpoint: String,

    pub subscription_id: String,

    pub api_version: String,

    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            subscription_id: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ArmConfig {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Defaults overridden by `ARM_SUBSCRIPTION_ID` and `ARM_ENDPOINT`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable source.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(subscription) = var("ARM_SUBSCRIPTION_ID").filter(|v| !v.is_empty()) {
            self.subscription_id = subscription;
        }
        if let Some(endpoint) = var("ARM_ENDPOINT").filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn validate(&self) -> ArmResult<()> {
        if self.subscription_id.trim().is_empty() {
            return Err(ArmError::Config("subscription_id is empty".into()));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ArmError::Config(format!(
                "endpoint {:?} is not an http(s) URL",
                self.endpoint
            )));
        }
        if self.api_version.is_empty() {
            return Err(ArmError::Config("api_version is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_subscription() {
        assert!(matches!(ArmConfig::default().validate(), Err(ArmError::Config(_))));
        assert!(ArmConfig::new("0000-1111").validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = ArmConfig::new("sub").with_endpoint("management.azure.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ArmConfig::default().with_overrides(|name| match name {
            "ARM_SUBSCRIPTION_ID" => Some("sub-from-env".to_string()),
            "ARM_ENDPOINT" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.subscription_id, "sub-from-env");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_partial_toml() {
        let config: ArmConfig = toml::from_str(r#"subscription_id = "abc""#).unwrap();
        assert_eq!(config.subscription_id, "abc");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }
}
