//! Tree-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeId;

/// Errors raised by tree mutation and layout.
///
/// All of them mean the tree or the call was misused; none are transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("invalid tree: {0}")]
    InvalidTree(String),

    #[error("node {node} is not a child of {parent}")]
    NotFound { node: NodeId, parent: NodeId },

    #[error("node already attached: {0}")]
    AlreadyAttached(NodeId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown node handle: {0}")]
    UnknownNode(NodeId),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
