//! Errors raised by tree operations.

use thiserror::Error;

use crate::NodeId;

/// Result alias used across the crate.
pub type DomResult<T> = Result<T, DomError>;

/// Everything that can go wrong while building, querying or mutating a tree.
///
/// Errors are fatal to the call that raised them, never to the tree: a failed
/// operation leaves the tree exactly as it found it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomError {
    /// A required argument was empty or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs the node to be attached to a parent.
    #[error("node {0:?} has no parent")]
    NoParent(NodeId),

    /// `child` was expected to be a child of `parent`.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The expected parent.
        parent: NodeId,
        /// The node that was not found among its children.
        child: NodeId,
    },

    /// Inserting `node` under `parent` would produce an invalid tree.
    #[error("cannot insert {node:?} into {parent:?}: {reason}")]
    HierarchyRequest {
        /// The would-be parent.
        parent: NodeId,
        /// The node being inserted.
        node: NodeId,
        /// What rule the insertion breaks.
        reason: &'static str,
    },

    /// An insertion index was outside `0..=len` after normalization.
    #[error("insert position {index} out of bounds for {len} children")]
    IndexOutOfBounds {
        /// The index as given by the caller.
        index: isize,
        /// The number of children at the time of the call.
        len: usize,
    },

    /// A regular expression given to a pattern query did not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The pattern as given.
        pattern: String,
        /// Why it was rejected.
        #[source]
        source: regex::Error,
    },

    /// Markup was given but no fragment parser is installed on the tree.
    #[error("no fragment parser installed; markup cannot be inserted")]
    NoFragmentParser,

    /// The fragment parser failed.
    #[error("fragment parse failed: {0}")]
    Parse(String),
}

impl DomError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
