//! Tidy layout for rooted, ordered trees.
//!
//! Build a [`Tree`] with [`Tree::add_child`] / [`Tree::add_node`], run
//! [`Tree::layout`] once mutation is done, then read coordinates with
//! [`Tree::position`] or [`Tree::position_f`].
//!
//! ```
//! use tidytree::Tree;
//!
//! let mut tree = Tree::new("a");
//! let root = tree.root();
//! let b = tree.add_child(root, "b").unwrap();
//! let c = tree.add_child(root, "c").unwrap();
//! tree.layout(1.0).unwrap();
//!
//! assert_eq!(tree.position_f(b, (0.0, 0.0), 1.0).unwrap(), (-0.5, 1.0));
//! assert_eq!(tree.position(c, (100, 0), (10.0, 50.0)).unwrap(), (105, 50));
//! ```

pub mod config;
pub mod display;
pub mod domain;
pub mod layout;
pub mod util;

pub use domain::{Node, NodeId, Tree, TreeError, TreeResult};
pub use layout::{Bounds, Scale, DEFAULT_DISTANCE};
