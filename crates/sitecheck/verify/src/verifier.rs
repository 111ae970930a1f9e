//! Existence and teardown verification.
//!
//! Both checks derive a [`CompoundRemoteKey`] from state and ask the
//! [`RemoteLookup`] about it. They differ in how they read the answer:
//!
//! | lookup result | `verify_exists`   | `verify_destroyed`            |
//! |---------------|-------------------|-------------------------------|
//! | found         | pass              | `ResourceStillExists`         |
//! | not found     | `ResourceAbsent`  | pass                          |
//! | error         | `LookupFailed`    | pass (after optional retries) |
//!
//! Treating a lookup error as "destroyed" means an unreachable control plane
//! can hide a leaked resource. That is the intended policy for teardown
//! checks; `VerifyConfig::destroy_lookup_retries` narrows the window.

use std::sync::Arc;
use std::time::Instant;

use sitecheck_types::{CompoundRemoteKey, ResourceAddress, StateSnapshot, TypesError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::VerifyConfig;
use crate::error::{Verdict, VerifyError, VerifyResult};
use crate::lookup::{LookupError, LookupOutcome, RemoteLookup};

/// Runs existence and teardown checks against one remote lookup.
pub struct Verifier {
    lookup: Arc<dyn RemoteLookup>,
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(lookup: Arc<dyn RemoteLookup>, config: VerifyConfig) -> Self {
        Self { lookup, config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Check that the resource at `address` in `snapshot` exists remotely.
    ///
    /// Lookup errors are surfaced as [`VerifyError::LookupFailed`] and not
    /// retried: the snapshot is taken after apply completed, so the
    /// resource is expected to be stable.
    #[instrument(skip(self, snapshot, address, cancel), fields(lookup = self.lookup.name(), address = %address))]
    pub async fn verify_exists(
        &self,
        snapshot: &StateSnapshot,
        address: &ResourceAddress,
        cancel: &CancellationToken,
    ) -> Verdict {
        let state = snapshot
            .get(address)
            .ok_or_else(|| VerifyError::NotInState(address.clone()))?;

        let key = self
            .config
            .key_schema
            .extract(&state.attributes)
            .map_err(|e| incomplete(address, e))?;

        let start = Instant::now();
        let outcome = self.lookup_once(&key, cancel, "existence lookup").await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(LookupOutcome::Found(_)) => {
                debug!(%key, latency_ms, "Resource exists remotely");
                Ok(())
            }
            Ok(LookupOutcome::NotFound) => Err(VerifyError::ResourceAbsent {
                address: address.clone(),
                key,
            }),
            Err(e) => Err(VerifyError::LookupFailed {
                key,
                reason: e.to_string(),
            }),
        }
    }

    /// Check that no instance of `tracked_type` left in `snapshot` is still
    /// reachable remotely.
    ///
    /// Instances whose key cannot be derived are skipped. The scan stops at
    /// the first instance that still exists. An empty scan passes.
    #[instrument(skip(self, snapshot, cancel), fields(lookup = self.lookup.name()))]
    pub async fn verify_destroyed(
        &self,
        snapshot: &StateSnapshot,
        tracked_type: &str,
        cancel: &CancellationToken,
    ) -> Verdict {
        let mut checked = 0usize;

        for state in snapshot.of_type(tracked_type) {
            let key = match self.config.key_schema.extract(&state.attributes) {
                Ok(key) => key,
                Err(e) => {
                    debug!(address = %state.address, reason = %e, "Skipping instance without remote key");
                    continue;
                }
            };

            checked += 1;
            if let Some(representation) = self.still_exists(&key, cancel).await? {
                return Err(VerifyError::ResourceStillExists {
                    address: state.address.clone(),
                    key,
                    representation,
                });
            }
        }

        info!(checked, "No tracked resources remain");
        Ok(())
    }

    /// `Some(representation)` if the key still resolves remotely.
    async fn still_exists(
        &self,
        key: &CompoundRemoteKey,
        cancel: &CancellationToken,
    ) -> VerifyResult<Option<serde_json::Value>> {
        let mut attempt = 0u32;

        loop {
            match self.lookup_once(key, cancel, "destroy lookup").await? {
                Ok(LookupOutcome::NotFound) => return Ok(None),
                Ok(LookupOutcome::Found(representation)) => return Ok(Some(representation)),
                Err(e) if attempt < self.config.destroy_lookup_retries => {
                    attempt += 1;
                    warn!(%key, error = %e, attempt, "Destroy lookup failed, retrying");
                    self.pause(cancel).await?;
                }
                Err(e) => {
                    warn!(%key, error = %e, "Destroy lookup failed, treating as destroyed");
                    return Ok(None);
                }
            }
        }
    }

    /// One lookup bounded by the configured timeout. The outer error is
    /// only ever [`VerifyError::Cancelled`].
    async fn lookup_once(
        &self,
        key: &CompoundRemoteKey,
        cancel: &CancellationToken,
        operation: &str,
    ) -> VerifyResult<Result<LookupOutcome, LookupError>> {
        let timeout = self.config.lookup_timeout;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(VerifyError::Cancelled {
                operation: operation.to_string(),
            }),
            result = tokio::time::timeout(timeout, self.lookup.lookup(key)) => Ok(match result {
                Ok(answer) => answer,
                Err(_) => Err(LookupError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            }),
        }
    }

    async fn pause(&self, cancel: &CancellationToken) -> VerifyResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(VerifyError::Cancelled {
                operation: "destroy retry delay".to_string(),
            }),
            _ = tokio::time::sleep(self.config.retry_delay) => Ok(()),
        }
    }
}

fn incomplete(address: &ResourceAddress, err: TypesError) -> VerifyError {
    let attribute = match err {
        TypesError::MissingAttribute { attribute } | TypesError::EmptyAttribute { attribute } => {
            attribute
        }
        TypesError::InvalidAddress(other) => other,
    };
    VerifyError::IncompleteState {
        address: address.clone(),
        attribute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{replicated_vm_key, replicated_vm_state, StubLookup};
    use std::time::Duration;

    fn address() -> ResourceAddress {
        "azurerm_site_recovery_replicated_vm.test".parse().unwrap()
    }

    fn snapshot() -> StateSnapshot {
        StateSnapshot::new(1, [replicated_vm_state("test", 42)])
    }

    #[tokio::test]
    async fn test_exists_found() {
        let stub = Arc::new(StubLookup::not_found());
        let key = replicated_vm_key(42);
        stub.set_found(key, serde_json::json!({"name": "repl-42"}));

        let verifier = Verifier::new(stub.clone(), VerifyConfig::default());
        let verdict = verifier
            .verify_exists(&snapshot(), &address(), &CancellationToken::new())
            .await;
        assert_eq!(verdict, Ok(()));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_exists_absent() {
        let verifier = Verifier::new(Arc::new(StubLookup::not_found()), VerifyConfig::default());
        let verdict = verifier
            .verify_exists(&snapshot(), &address(), &CancellationToken::new())
            .await;
        assert!(matches!(verdict, Err(VerifyError::ResourceAbsent { .. })));
    }

    #[tokio::test]
    async fn test_exists_lookup_error_is_not_retried() {
        let stub = Arc::new(StubLookup::failing("connection reset"));
        let verifier = Verifier::new(
            stub.clone(),
            VerifyConfig::default().with_destroy_retries(5, Duration::ZERO),
        );
        let verdict = verifier
            .verify_exists(&snapshot(), &address(), &CancellationToken::new())
            .await;
        assert!(matches!(verdict, Err(VerifyError::LookupFailed { .. })));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_exists_not_in_state() {
        let verifier = Verifier::new(Arc::new(StubLookup::not_found()), VerifyConfig::default());
        let verdict = verifier
            .verify_exists(&StateSnapshot::empty(1), &address(), &CancellationToken::new())
            .await;
        assert_eq!(verdict, Err(VerifyError::NotInState(address())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exists_timeout_is_lookup_failure() {
        let stub = Arc::new(StubLookup::not_found().with_delay(Duration::from_secs(120)));
        let verifier = Verifier::new(
            stub,
            VerifyConfig::default().with_lookup_timeout(Duration::from_secs(1)),
        );
        let verdict = verifier
            .verify_exists(&snapshot(), &address(), &CancellationToken::new())
            .await;
        match verdict {
            Err(VerifyError::LookupFailed { reason, .. }) => {
                assert!(reason.contains("timed out after 1000ms"))
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_retries_then_sees_leak() {
        let stub = Arc::new(StubLookup::not_found().with_failures(2, "gateway timeout"));
        let key = replicated_vm_key(42);
        stub.set_found(key, serde_json::json!({"properties": {}}));

        let verifier = Verifier::new(
            stub.clone(),
            VerifyConfig::default().with_destroy_retries(3, Duration::from_secs(1)),
        );
        let verdict = verifier
            .verify_destroyed(
                &snapshot(),
                "azurerm_site_recovery_replicated_vm",
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(verdict, Err(VerifyError::ResourceStillExists { .. })));
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_lookup() {
        let stub = Arc::new(StubLookup::not_found());
        let verifier = Verifier::new(stub.clone(), VerifyConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let verdict = verifier.verify_exists(&snapshot(), &address(), &cancel).await;
        assert!(matches!(verdict, Err(VerifyError::Cancelled { .. })));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_incomplete_maps_attribute() {
        let err = incomplete(
            &address(),
            TypesError::EmptyAttribute {
                attribute: "name".into(),
            },
        );
        assert_eq!(
            err,
            VerifyError::IncompleteState {
                address: address(),
                attribute: "name".into()
            }
        );
    }
}
