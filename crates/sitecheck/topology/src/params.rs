//! Rendering parameters.

use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};

/// Options that shape the names and locations of generated resources.
///
/// `unique_suffix` is applied to every generated name so that concurrent
/// runs against the same subscription do not collide. Picking it is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyParams {
    /// Region of the source side.
    pub primary_location: String,

    /// Region of the recovery side.
    pub secondary_location: String,

    /// Collision-avoidance token.
    pub unique_suffix: u64,
}

impl TopologyParams {
    pub fn new(
        primary_location: impl Into<String>,
        secondary_location: impl Into<String>,
        unique_suffix: u64,
    ) -> Self {
        Self {
            primary_location: primary_location.into(),
            secondary_location: secondary_location.into(),
            unique_suffix,
        }
    }

    pub fn validate(&self) -> TopologyResult<()> {
        if self.primary_location.trim().is_empty() {
            return Err(TopologyError::EmptyParameter("primary_location"));
        }
        if self.secondary_location.trim().is_empty() {
            return Err(TopologyError::EmptyParameter("secondary_location"));
        }
        Ok(())
    }

    /// Value of a template placeholder, if it is one of ours.
    pub fn lookup(&self, placeholder: &str) -> Option<String> {
        match placeholder {
            "primary_location" => Some(self.primary_location.clone()),
            "secondary_location" => Some(self.secondary_location.clone()),
            "unique_suffix" => Some(self.unique_suffix.to_string()),
            _ => None,
        }
    }
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self::new("westeurope", "northeurope", 0)
    }
}
