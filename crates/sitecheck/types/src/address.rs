//! Resource addresses.
//!
//! An address names one declared resource by its type and logical name, the
//! same way the provisioning engine refers to it (`<type>.<name>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Address of one resource instance in a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceAddress {
    resource_type: String,
    name: String,
}

impl ResourceAddress {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Resource kind, e.g. `azurerm_site_recovery_fabric`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Logical name, unique within its type.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

impl FromStr for ResourceAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((ty, name))
                if !ty.is_empty() && !name.is_empty() && !name.contains('.') =>
            {
                Ok(Self::new(ty, name))
            }
            _ => Err(TypesError::InvalidAddress(s.to_string())),
        }
    }
}
