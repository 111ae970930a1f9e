//! Structural key matching over indexed collections.
//!
//! A [`KeyPattern`] is a fixed prefix, a decimal index wildcard and a fixed
//! suffix: `network_interface.*.target_subnet_name` matches
//! `network_interface.0.target_subnet_name` and
//! `network_interface.17.target_subnet_name`, but not the count entry
//! `network_interface.#`.

use regex::Regex;
use sitecheck_types::{AttributeStore, BlockIndex};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::error::{Verdict, VerifyError};

const WILDCARD: char = '*';

/// Prefix, index wildcard, suffix.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    prefix: String,
    suffix: String,
    matcher: Regex,
}

impl KeyPattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self, VerifyError> {
        let prefix = prefix.into();
        let suffix = suffix.into();
        let matcher = Regex::new(&format!(
            "^{}([0-9]+){}$",
            regex::escape(&prefix),
            regex::escape(&suffix)
        ))
        .map_err(|e| VerifyError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            prefix,
            suffix,
            matcher,
        })
    }

    /// Index captured by the wildcard, if `key` has this shape.
    pub fn index_of(&self, key: &str) -> Option<BlockIndex> {
        self.matcher
            .captures(key)
            .and_then(|c| c.get(1))
            .and_then(|m| BlockIndex::parse(m.as_str()))
    }

    pub fn matches(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl FromStr for KeyPattern {
    type Err = VerifyError;

    /// Parse `prefix*suffix`; exactly one `*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(WILDCARD);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Self::new(prefix, suffix),
            _ => Err(VerifyError::InvalidPattern(s.to_string())),
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, WILDCARD, self.suffix)
    }
}

impl PartialEq for KeyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.suffix == other.suffix
    }
}

impl Eq for KeyPattern {}

/// Check the value of the first key in `store` matching `pattern`.
///
/// Keys are visited in ascending index order, so the lowest index that
/// matches is the one compared; later matches are never looked at, even if
/// one of them holds `expected`.
pub fn match_attribute(store: &AttributeStore, pattern: &KeyPattern, expected: &str) -> Verdict {
    let first = store
        .iter()
        .inspect(|(key, _)| trace!(key, "Testing state key"))
        .filter_map(|(key, value)| pattern.index_of(key).map(|index| (index, key, value)))
        .min_by(|(a, _, _), (b, _, _)| a.cmp(b));

    match first {
        Some((index, _, value)) if value == expected => {
            debug!(%pattern, %index, "Attribute matched");
            Ok(())
        }
        Some((_, key, value)) => Err(VerifyError::ValueMismatch {
            key: key.to_string(),
            actual: value.to_string(),
            expected: expected.to_string(),
        }),
        None => Err(VerifyError::AttributeNotFound {
            pattern: pattern.to_string(),
        }),
    }
}
