//! Structured error types shared across cemc crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CemcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (site indices, species labels, sizes).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the cemc engine.
///
/// Configuration problems surface at construction through the `Config`,
/// `Lattice` and `Processor` families and abort immediately. Recoverable
/// mid-chain conditions (no eligible site for a move) are never represented
/// as errors; ushers return empty proposals instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CemcError {
    /// Run or table configuration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Sublattice partition and occupancy encoding errors.
    #[error("lattice error: {0}")]
    Lattice(ErrorInfo),
    /// Malformed move proposals (fatal setup problems, not null moves).
    #[error("proposal error: {0}")]
    Proposal(ErrorInfo),
    /// Feature/energy processor errors, including delta verification.
    #[error("processor error: {0}")]
    Processor(ErrorInfo),
    /// Sampler driver errors.
    #[error("sampling error: {0}")]
    Sampling(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CemcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CemcError::Config(info)
            | CemcError::Lattice(info)
            | CemcError::Proposal(info)
            | CemcError::Processor(info)
            | CemcError::Sampling(info)
            | CemcError::Serde(info) => info,
        }
    }
}
