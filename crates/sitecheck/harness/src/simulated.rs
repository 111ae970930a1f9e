//! In-memory provisioning engine and control plane for dry runs.
//!
//! [`SimulatedProvisioner`] realizes a rendered topology node by node in
//! realization order, flattening properties into attribute stores and
//! resolving references against nodes realized earlier. Every realized
//! resource whose attributes form a complete [`CompoundRemoteKey`] is
//! published to an [`InMemoryRemote`], which answers lookups the way the
//! real control plane would.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::{Map, Value};
use sitecheck_topology::{PropertyValue, RenderedTopology, ResourceNode};
use sitecheck_types::{
    AttributeStore, CompoundRemoteKey, KeySchema, ResourceAddress, ResourceState, StateSnapshot,
    COUNT_SEGMENT,
};
use sitecheck_verify::{LookupError, LookupOutcome, RemoteLookup};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::provisioner::{ProvisionError, Provisioner};

const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Control plane held in memory.
#[derive(Default)]
pub struct InMemoryRemote {
    items: DashMap<CompoundRemoteKey, Value>,
    unreachable: AtomicBool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: CompoundRemoteKey, representation: Value) {
        self.items.insert(key, representation);
    }

    pub fn remove(&self, key: &CompoundRemoteKey) -> Option<Value> {
        self.items.remove(key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &CompoundRemoteKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// While set, every lookup fails with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteLookup for InMemoryRemote {
    async fn lookup(&self, key: &CompoundRemoteKey) -> Result<LookupOutcome, LookupError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(LookupError::Transport("control plane unreachable".into()));
        }
        Ok(match self.items.get(key) {
            Some(item) => LookupOutcome::Found(item.clone()),
            None => LookupOutcome::NotFound,
        })
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Provisioning engine backed by an [`InMemoryRemote`].
pub struct SimulatedProvisioner {
    remote: Arc<InMemoryRemote>,
    key_schema: KeySchema,
    serial: AtomicU64,
    /// Realized resources per rendered topology, in realization order.
    deployments: DashMap<String, Vec<ResourceState>>,
    /// Resources destroy leaves behind remotely.
    leaks: DashSet<ResourceAddress>,
    /// Attribute overrides applied to imports only.
    drift: DashMap<ResourceAddress, BTreeMap<String, String>>,
    fail_apply: AtomicBool,
}

impl SimulatedProvisioner {
    pub fn new(remote: Arc<InMemoryRemote>) -> Self {
        Self {
            remote,
            key_schema: KeySchema::replicated_vm(),
            serial: AtomicU64::new(0),
            deployments: DashMap::new(),
            leaks: DashSet::new(),
            drift: DashMap::new(),
            fail_apply: AtomicBool::new(false),
        }
    }

    pub fn with_key_schema(mut self, schema: KeySchema) -> Self {
        self.key_schema = schema;
        self
    }

    /// Destroy will remove `address` from state but not from the remote.
    pub fn leak(&self, address: ResourceAddress) {
        self.leaks.insert(address);
    }

    /// Imports of `address` will report `key = value` regardless of state.
    pub fn drift(&self, address: ResourceAddress, key: impl Into<String>, value: impl Into<String>) {
        self.drift
            .entry(address)
            .or_default()
            .insert(key.into(), value.into());
    }

    /// The next apply realizes half the topology, then fails.
    pub fn fail_next_apply(&self) {
        self.fail_apply.store(true, Ordering::SeqCst);
    }

    /// Resources currently realized.
    pub fn realized(&self) -> usize {
        self.deployments.iter().map(|d| d.value().len()).sum()
    }

    fn realize(
        &self,
        node: &ResourceNode,
        done: &HashMap<ResourceAddress, ResourceState>,
    ) -> Result<ResourceState, ProvisionError> {
        let mut attributes = BTreeMap::new();
        for (name, value) in &node.properties {
            flatten(name, value, done, &mut attributes)?;
        }

        let id = resource_id(node, &attributes);
        attributes.insert("id".to_string(), id.clone());

        Ok(ResourceState::new(
            node.address.clone(),
            id,
            attributes.into_iter().collect(),
        ))
    }

    fn publish(&self, state: &ResourceState) {
        if let Ok(key) = self.key_schema.extract(&state.attributes) {
            debug!(address = %state.address, %key, "Publishing remote item");
            self.remote.insert(key, representation(state));
        }
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    async fn apply(&self, topology: &RenderedTopology) -> Result<StateSnapshot, ProvisionError> {
        let nodes = topology.realization_order();
        let fail_at = self
            .fail_apply
            .swap(false, Ordering::SeqCst)
            .then_some(nodes.len() / 2);

        let mut done: HashMap<ResourceAddress, ResourceState> = HashMap::new();
        let mut ordered = Vec::with_capacity(nodes.len());
        let mut failure = None;
        for (i, node) in nodes.iter().enumerate() {
            if fail_at == Some(i) {
                break;
            }
            match self.realize(node, &done) {
                Ok(state) => {
                    self.publish(&state);
                    ordered.push(state.clone());
                    done.insert(state.address.clone(), state);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if failure.is_none() && fail_at.is_some() {
            failure = Some(ProvisionError::new(format!(
                "simulated apply failure after {} of {} resources",
                ordered.len(),
                nodes.len()
            )));
        }
        // Whatever was realized stays recorded so destroy can remove it.
        self.deployments.insert(topology.text().to_string(), ordered);
        if let Some(e) = failure {
            return Err(e);
        }

        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StateSnapshot::new(serial, done.into_values()))
    }

    async fn destroy(&self, topology: &RenderedTopology) -> Result<(), ProvisionError> {
        let Some((_, states)) = self.deployments.remove(topology.text()) else {
            return Ok(());
        };
        for state in states.iter().rev() {
            if self.leaks.contains(&state.address) {
                debug!(address = %state.address, "Leaving resource behind");
                continue;
            }
            if let Ok(key) = self.key_schema.extract(&state.attributes) {
                self.remote.remove(&key);
            }
        }
        self.serial.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn import(
        &self,
        address: &ResourceAddress,
        id: &str,
    ) -> Result<AttributeStore, ProvisionError> {
        let state = self
            .deployments
            .iter()
            .find_map(|deployment| {
                deployment
                    .value()
                    .iter()
                    .find(|s| &s.address == address && s.id == id)
                    .map(|s| s.attributes.clone())
            })
            .ok_or_else(|| ProvisionError::new(format!("cannot import {address}: no resource with id {id}")))?;

        let Some(overrides) = self.drift.get(address) else {
            return Ok(state);
        };
        let mut entries: BTreeMap<String, String> = state
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.extend(overrides.value().iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(entries.into_iter().collect())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

fn flatten(
    key: &str,
    value: &PropertyValue,
    done: &HashMap<ResourceAddress, ResourceState>,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ProvisionError> {
    match value {
        PropertyValue::Text(text) => {
            out.insert(key.to_string(), text.clone());
        }
        PropertyValue::Integer(n) => {
            out.insert(key.to_string(), n.to_string());
        }
        PropertyValue::Bool(b) => {
            out.insert(key.to_string(), b.to_string());
        }
        PropertyValue::Ref(reference) => {
            let target = done.get(&reference.target).ok_or_else(|| {
                ProvisionError::new(format!(
                    "{key} refers to {} which is not realized yet",
                    reference.target
                ))
            })?;
            out.insert(key.to_string(), computed(target, &reference.attribute));
        }
        PropertyValue::List(items) => {
            out.insert(format!("{key}.{COUNT_SEGMENT}"), items.len().to_string());
            for (index, item) in items.iter().enumerate() {
                flatten(&format!("{key}.{index}"), item, done, out)?;
            }
        }
        PropertyValue::Blocks(blocks) => {
            out.insert(format!("{key}.{COUNT_SEGMENT}"), blocks.len().to_string());
            for (index, block) in blocks.iter().enumerate() {
                for (field, value) in &block.properties {
                    flatten(&format!("{key}.{index}.{field}"), value, done, out)?;
                }
            }
        }
    }
    Ok(())
}

/// Value of `attribute` on `target`. Attributes the declaration never set
/// are computed by the control plane; they get a stable value under the
/// target's id.
fn computed(target: &ResourceState, attribute: &str) -> String {
    match target.attributes.get(attribute) {
        Some(value) => value.to_string(),
        None => format!("{}/{}", target.id, attribute.replace('.', "/")),
    }
}

fn resource_id(node: &ResourceNode, attributes: &BTreeMap<String, String>) -> String {
    let name = attributes
        .get("name")
        .map(String::as_str)
        .unwrap_or_else(|| node.address.name());
    match attributes.get("resource_group_name") {
        Some(group) => format!(
            "/subscriptions/{SUBSCRIPTION}/resourceGroups/{group}/providers/{}/{name}",
            node.address.resource_type()
        ),
        None => format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/{name}"),
    }
}

fn representation(state: &ResourceState) -> Value {
    let properties: Map<String, Value> = state
        .attributes
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    serde_json::json!({
        "id": state.id,
        "name": state.attributes.get("name"),
        "properties": properties,
    })
}
