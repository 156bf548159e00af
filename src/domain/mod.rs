//! Domain layer: the tree structure and its cross-links
//!
//! This layer is independent of layout concerns (no coordinates are computed here).

pub mod error;
pub mod iter;
pub mod node;
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use iter::{PostOrderIterator, TreeIterator};
pub use node::{Node, NodeId};
pub use tree::Tree;
