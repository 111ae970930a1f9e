//! Check reports.
//!
//! Every verification check ends in exactly one [`CheckReport`]: passed, or
//! failed with a message. There is no warning state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of verification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    /// Local resource has a live remote counterpart.
    Exists,
    /// A value inside an indexed collection matches.
    AttributeMatch,
    /// Re-imported state matches applied state.
    Import,
    /// No tracked resource remains after teardown.
    Destroyed,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Exists => write!(f, "exists"),
            CheckKind::AttributeMatch => write!(f, "attribute-match"),
            CheckKind::Import => write!(f, "import"),
            CheckKind::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Outcome of one verification check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub kind: CheckKind,

    /// What was checked, e.g. a resource address or key pattern.
    pub subject: String,

    pub passed: bool,

    /// Failure explanation; `None` when the check passed.
    pub message: Option<String>,

    pub latency_ms: u64,

    pub timestamp: DateTime<Utc>,
}

impl CheckReport {
    pub fn pass(kind: CheckKind, subject: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            kind,
            subject: subject.into(),
            passed: true,
            message: None,
            latency_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn fail(
        kind: CheckKind,
        subject: impl Into<String>,
        message: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            passed: false,
            message: Some(message.into()),
            latency_ms,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            None => write!(f, "[pass] {} {}", self.kind, self.subject),
            Some(msg) => write!(f, "[fail] {} {}: {}", self.kind, self.subject, msg),
        }
    }
}
