//! Index segments of flattened collections.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Decimal index segment of a collection key, of any length.
///
/// Orders numerically (`9` before `10`) without parsing into a fixed-width
/// integer, so an index longer than `u64` still takes part in ordering.
/// Segments that differ only in leading zeros are distinct keys and order by
/// their raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockIndex(String);

impl BlockIndex {
    /// `None` unless `segment` is one or more ASCII digits.
    pub fn parse(segment: &str) -> Option<Self> {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(segment.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, when it fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    fn significant(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl From<u64> for BlockIndex {
    fn from(index: u64) -> Self {
        Self(index.to_string())
    }
}

impl Ord for BlockIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for BlockIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
