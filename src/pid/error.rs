//! PID error types.
//!
//! Two families live here:
//!
//! - [`PidIssue`] values are structural findings collected by
//!   [`super::validate`]. A validation returns every issue it found, not
//!   just the first.
//! - [`PidError`] is what fallible operations return. Construction
//!   mistakes (missing country, bad collision counter) map to their own
//!   variants; a failed structural validation is wrapped whole in
//!   [`PidError::Invalid`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PidLevel;

/// Machine-readable code of a structural PID problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PidErrorCode {
    EmptyPid,
    InvalidCharacters,
    InvalidCountryCode,
    InvalidComponentCode,
    ExcessComponents,
    ParseError,
}

impl std::fmt::Display for PidErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            PidErrorCode::EmptyPid => "EMPTY_PID",
            PidErrorCode::InvalidCharacters => "INVALID_CHARACTERS",
            PidErrorCode::InvalidCountryCode => "INVALID_COUNTRY_CODE",
            PidErrorCode::InvalidComponentCode => "INVALID_COMPONENT_CODE",
            PidErrorCode::ExcessComponents => "EXCESS_COMPONENTS",
            PidErrorCode::ParseError => "PARSE_ERROR",
        };
        f.write_str(code)
    }
}

/// A single structural problem found in a PID string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidIssue {
    /// Offending level; `None` when the problem concerns the whole string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<PidLevel>,
    pub code: PidErrorCode,
    pub message: String,
}

impl PidIssue {
    /// Issue about the string as a whole
    pub fn format(code: PidErrorCode, message: impl Into<String>) -> Self {
        Self {
            component: None,
            code,
            message: message.into(),
        }
    }

    /// Issue tied to one hierarchy level
    pub fn at(level: PidLevel, code: PidErrorCode, message: impl Into<String>) -> Self {
        Self {
            component: Some(level),
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PidIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors returned by PID operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PidError {
    #[error("Country code is required for PID encoding")]
    MissingCountry,

    #[error("Collision counter must be between 1 and 99, got {0}")]
    InvalidCollisionCounter(i64),

    #[error("PID must be a non-empty string")]
    EmptyPid,

    #[error("{0} component is empty")]
    EmptyComponent(PidLevel),

    #[error("cannot set {level} here, {expected} comes next")]
    OutOfOrder { level: PidLevel, expected: PidLevel },

    #[error("PID has {0} positional components, at most 8 are allowed")]
    ExcessComponents(usize),

    /// Structural validation failed; carries every issue found
    #[error("Invalid PID: {}", join_messages(.0))]
    Invalid(Vec<PidIssue>),
}

impl PidError {
    /// Structural issues behind this error, if it came from validation
    pub fn issues(&self) -> &[PidIssue] {
        match self {
            PidError::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

fn join_messages(issues: &[PidIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
