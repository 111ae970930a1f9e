//! Flattened attribute stores.
//!
//! An [`AttributeStore`] is the realized state of one resource instance as the
//! provisioning engine reports it after an apply. Stores are immutable once
//! built; a refresh produces a new store rather than editing an old one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{TypesError, TypesResult};
use crate::index::BlockIndex;

/// Key segment carrying the element count of a flattened collection.
pub const COUNT_SEGMENT: &str = "#";

/// Flattened state of one resource instance.
///
/// Keys are dotted paths. Repeated sub-blocks use a numeric index segment
/// (`managed_disk.0.disk_id`) and a count entry (`managed_disk.#`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore {
    entries: BTreeMap<String, String>,
}

impl AttributeStore {
    /// Start building a new store.
    pub fn builder() -> AttributeStoreBuilder {
        AttributeStoreBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a value that must be present and non-empty.
    pub fn require(&self, key: &str) -> TypesResult<&str> {
        match self.entries.get(key) {
            None => Err(TypesError::MissingAttribute {
                attribute: key.to_string(),
            }),
            Some(v) if v.is_empty() => Err(TypesError::EmptyAttribute {
                attribute: key.to_string(),
            }),
            Some(v) => Ok(v),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Declared element count of a collection, read from its `#` entry.
    pub fn block_count(&self, block: &str) -> Option<usize> {
        self.get(&format!("{block}.{COUNT_SEGMENT}"))
            .and_then(|v| v.parse().ok())
    }

    /// Sub-blocks of one repeated collection, keyed by index.
    ///
    /// The outer map iterates in ascending numeric index order (so `2` comes
    /// before `10`), which is the order verification treats as canonical.
    /// Inner keys are the remainder of the path after the index segment.
    pub fn indexed_blocks(&self, block: &str) -> BTreeMap<BlockIndex, BTreeMap<String, String>> {
        let prefix = format!("{block}.");
        let mut blocks: BTreeMap<BlockIndex, BTreeMap<String, String>> = BTreeMap::new();

        for (key, value) in self.entries.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            let Some((index, field)) = rest.split_once('.') else {
                continue;
            };
            let Some(index) = BlockIndex::parse(index) else {
                continue;
            };
            blocks
                .entry(index)
                .or_default()
                .insert(field.to_string(), value.clone());
        }

        blocks
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Builder for [`AttributeStore`].
///
/// Keeps `#` count entries consistent with the blocks and lists it was given.
#[derive(Debug, Default)]
pub struct AttributeStoreBuilder {
    entries: BTreeMap<String, String>,
    collections: BTreeMap<String, BTreeSet<u64>>,
}

impl AttributeStoreBuilder {
    /// Set a scalar attribute.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Set one indexed sub-block of a repeated collection.
    pub fn block<K, V>(
        mut self,
        block: &str,
        index: u64,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (field, value) in fields {
            self.entries
                .insert(format!("{block}.{index}.{}", field.as_ref()), value.into());
        }
        self.collections
            .entry(block.to_string())
            .or_default()
            .insert(index);
        self
    }

    /// Set a list of scalars, indexed in the given order.
    pub fn list<V: Into<String>>(mut self, key: &str, values: impl IntoIterator<Item = V>) -> Self {
        let indices = self.collections.entry(key.to_string()).or_default();
        for (index, value) in values.into_iter().enumerate() {
            let index = index as u64;
            self.entries.insert(format!("{key}.{index}"), value.into());
            indices.insert(index);
        }
        self
    }

    pub fn build(mut self) -> AttributeStore {
        for (collection, indices) in self.collections {
            self.entries.insert(
                format!("{collection}.{COUNT_SEGMENT}"),
                indices.len().to_string(),
            );
        }
        AttributeStore {
            entries: self.entries,
        }
    }
}
