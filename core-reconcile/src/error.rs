//! Error taxonomy of the reconciliation core

use std::fmt;

use client_traits::ClientError;
use core_retry::RetryError;
use thiserror::Error;

/// Reconciler operation names, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Restart,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Create => "create",
            Op::Read => "read",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Import => "import",
            Op::Restart => "restart",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by reconcilers.
///
/// Remote failures always arrive wrapped in `Operation`, carrying the
/// operation name, the resource kind, its identifier and the underlying
/// retry outcome. Drift (a table-matched not-found on Read) is not an
/// error; it heals silently into `Outcome::Absent`.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A remote call failed past the retry boundary
    #[error("unable to {op} {kind} `{id}`: {source}")]
    Operation {
        op: Op,
        kind: &'static str,
        id: String,
        #[source]
        source: RetryError<ClientError>,
    },

    /// Update attempted on a resource kind whose identity is content-derived
    #[error("{kind} does not support in-place updates; replace the resource instead")]
    UnsupportedUpdate { kind: &'static str },

    /// An externally supplied identifier could not be parsed
    #[error("unable to parse identifier `{id}`: {reason}")]
    InvalidId { id: String, reason: String },

    /// A payload matched the base64 shape but failed to decode
    #[error("unable to decode stored content: {0}")]
    Encoding(String),

    /// The appliance reported success but the response collection carried
    /// no entity for the addressed resource
    #[error("{kind} `{id}`: response carried no matching entity")]
    MissingEntity { kind: &'static str, id: String },

    /// An attribute set could not be moved across the type-erased boundary
    #[error("invalid attribute set: {0}")]
    Attributes(#[from] serde_json::Error),
}

impl ReconcileError {
    pub(crate) fn operation(
        op: Op,
        kind: &'static str,
        id: impl Into<String>,
        source: RetryError<ClientError>,
    ) -> Self {
        ReconcileError::Operation {
            op,
            kind,
            id: id.into(),
            source,
        }
    }

    pub(crate) fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ReconcileError::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_carries_context() {
        let error = ReconcileError::operation(
            Op::Read,
            "real_server",
            "5/2",
            RetryError::Permanent(ClientError::api(422, "Unknown VS")),
        );

        let rendered = error.to_string();
        assert!(rendered.contains("read"));
        assert!(rendered.contains("real_server"));
        assert!(rendered.contains("5/2"));
        assert!(rendered.contains("Unknown VS"));
    }
}
