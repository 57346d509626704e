use crate::js::SyntaxError;
use thiserror::Error;

/// Failure of a single patch step.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{what} matched {found} time(s), expected {expected}")]
    MatchCountMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot {operation} on {node_type}: {reason}")]
    StructuralPrecondition {
        operation: &'static str,
        node_type: &'static str,
        reason: String,
    },

    #[error("failed to parse code fragment: {source}")]
    FragmentParse {
        #[source]
        source: SyntaxError,
    },

    #[error("failed to parse bundle source: {source}")]
    SourceParse {
        #[source]
        source: SyntaxError,
    },

    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("process patch failed: {source}")]
    Process { source: anyhow::Error },
}

impl PatchError {
    pub(crate) fn precondition(
        operation: &'static str,
        node_type: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        PatchError::StructuralPrecondition {
            operation,
            node_type,
            reason: reason.into(),
        }
    }

    pub(crate) fn fragment(source: SyntaxError) -> Self {
        PatchError::FragmentParse { source }
    }
}

/// Enforce an optional expected match count.
///
/// Absent expectations are never enforced; the count is only logged.
pub(crate) fn check_count(
    what: impl FnOnce() -> String,
    expected: Option<usize>,
    found: usize,
) -> Result<(), PatchError> {
    match expected {
        Some(expected) if expected != found => Err(PatchError::MatchCountMismatch {
            what: what(),
            expected,
            found,
        }),
        _ => Ok(()),
    }
}
