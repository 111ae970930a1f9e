//! Bearer token acquisition.

use async_trait::async_trait;

use crate::error::{ArmError, ArmResult};

/// Variable [`EnvToken`] reads by default.
pub const ACCESS_TOKEN_VAR: &str = "ARM_ACCESS_TOKEN";

/// Supplies the bearer token attached to every request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> ArmResult<String>;
}

/// A fixed token, for tests and short-lived runs.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> ArmResult<String> {
        Ok(self.0.clone())
    }
}

/// Token read from an environment variable on every request, so a rotated
/// token is picked up without rebuilding the client.
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> ArmResult<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ArmError::Token(format!("{} is not set", self.var))),
        }
    }
}
