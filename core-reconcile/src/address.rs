//! Identifier resolution for the appliance's composite addressing schemes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Scoped identifier for resources nested under a virtual service.
///
/// The appliance addresses such resources with a (parent index, child
/// index) pair and overloads the child parameter: prefixed with `!` it
/// addresses the exact child index, bare it addresses by list position
/// ("first/next match"). [`ScopedId::child_query`] makes that explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopedId {
    pub parent: i32,
    pub child: i32,
}

impl ScopedId {
    pub fn new(parent: i32, child: i32) -> Self {
        Self { parent, child }
    }

    /// The parent parameter value the remote endpoint expects
    pub fn parent_query(&self) -> String {
        self.parent.to_string()
    }

    /// The child parameter value; `exact` selects exact-index addressing
    pub fn child_query(&self, exact: bool) -> String {
        if exact {
            format!("!{}", self.child)
        } else {
            self.child.to_string()
        }
    }

    /// Parse an externally supplied `parent/child` identifier.
    ///
    /// No partial resolution: a missing separator or non-numeric segment
    /// is an [`ReconcileError::InvalidId`].
    pub fn parse(id: &str) -> Result<Self> {
        let (parent, child) = split_pair(id)?;
        let parent = parent
            .parse::<i32>()
            .map_err(|_| ReconcileError::invalid_id(id, "parent index is not a number"))?;
        let child = child
            .parse::<i32>()
            .map_err(|_| ReconcileError::invalid_id(id, "child index is not a number"))?;
        Ok(Self { parent, child })
    }
}

impl fmt::Display for ScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent, self.child)
    }
}

/// Split a `left/right` composite identifier into its two components
pub fn split_pair(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() && !right.contains('/') => {
            Ok((left, right))
        }
        _ => Err(ReconcileError::invalid_id(
            id,
            "expected exactly two `/`-separated components",
        )),
    }
}

/// Validate a flat opaque name identifier (rule names, blob filenames)
pub fn parse_flat(id: &str) -> Result<&str> {
    if id.is_empty() {
        return Err(ReconcileError::invalid_id(id, "identifier is empty"));
    }
    Ok(id)
}
