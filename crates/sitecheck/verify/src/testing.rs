//! Test doubles for the verification seams.

use async_trait::async_trait;
use dashmap::DashMap;
use sitecheck_types::{AttributeStore, CompoundRemoteKey, KeySchema, ResourceAddress, ResourceState};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use crate::lookup::{LookupError, LookupOutcome, RemoteLookup};

/// Scripted [`RemoteLookup`].
///
/// Keys registered with [`StubLookup::set_found`] answer `Found`; every
/// other key gets the fallback answer the stub was built with.
pub struct StubLookup {
    found: DashMap<CompoundRemoteKey, serde_json::Value>,
    fallback: Result<LookupOutcome, LookupError>,
    pending_failures: AtomicU32,
    failure_reason: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubLookup {
    fn with_fallback(fallback: Result<LookupOutcome, LookupError>) -> Self {
        Self {
            found: DashMap::new(),
            fallback,
            pending_failures: AtomicU32::new(0),
            failure_reason: String::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Unregistered keys are not found.
    pub fn not_found() -> Self {
        Self::with_fallback(Ok(LookupOutcome::NotFound))
    }

    /// Unregistered keys fail with a transport error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_fallback(Err(LookupError::Transport(reason.into())))
    }

    /// The next `count` lookups fail with a transport error regardless of key.
    pub fn with_failures(mut self, count: u32, reason: impl Into<String>) -> Self {
        self.pending_failures = AtomicU32::new(count);
        self.failure_reason = reason.into();
        self
    }

    /// Every lookup sleeps before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_found(&self, key: CompoundRemoteKey, representation: serde_json::Value) {
        self.found.insert(key, representation);
    }

    pub fn remove(&self, key: &CompoundRemoteKey) {
        self.found.remove(key);
    }

    /// Lookups started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RemoteLookup for StubLookup {
    async fn lookup(&self, key: &CompoundRemoteKey) -> Result<LookupOutcome, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_failure() {
            return Err(LookupError::Transport(self.failure_reason.clone()));
        }

        match self.found.get(key) {
            Some(representation) => Ok(LookupOutcome::Found(representation.clone())),
            None => self.fallback.clone(),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Attributes of a replicated VM as the provider records them, with all
/// scoping names derived from `suffix`.
pub fn replicated_vm_attributes(suffix: u64) -> AttributeStore {
    AttributeStore::builder()
        .set("name", format!("repl-{suffix}"))
        .set("resource_group_name", format!("acctestRG-recovery-{suffix}-2"))
        .set("recovery_vault_name", format!("acctest-vault-{suffix}"))
        .set("source_recovery_fabric_name", format!("acctest-fabric1-{suffix}"))
        .set("target_recovery_fabric_id", format!("/fabrics/acctest-fabric2-{suffix}"))
        .set(
            "source_recovery_protection_container_name",
            format!("acctest-protection-cont1-{suffix}"),
        )
        .set("source_vm_id", format!("/virtualMachines/vm-{suffix}"))
        .block(
            "network_interface",
            0,
            [("target_subnet_name", format!("snet-{suffix}_2"))],
        )
        .build()
}

/// A `azurerm_site_recovery_replicated_vm` instance named `name`.
pub fn replicated_vm_state(name: &str, suffix: u64) -> ResourceState {
    ResourceState::new(
        ResourceAddress::new("azurerm_site_recovery_replicated_vm", name),
        format!("/replicationMigrationItems/repl-{suffix}"),
        replicated_vm_attributes(suffix),
    )
}

/// Remote key of [`replicated_vm_state`].
pub fn replicated_vm_key(suffix: u64) -> CompoundRemoteKey {
    // Attributes are generated, so every key component is present.
    match KeySchema::replicated_vm().extract(&replicated_vm_attributes(suffix)) {
        Ok(key) => key,
        Err(e) => panic!("generated replicated VM attributes are incomplete: {e}"),
    }
}
