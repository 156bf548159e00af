//! Text rendering of tree structure via `termtree`, for logs and debugging.

use std::fmt::Display;

use termtree::Tree as TermTree;

use crate::domain::{Node, NodeId, Tree};

pub trait ToTermTree {
    /// Payload labels only.
    fn to_tree_string(&self) -> TermTree<String>;

    /// Payload labels with layout coordinates, e.g. `b2 (-1.75, 1.00)`.
    fn to_layout_tree(&self) -> TermTree<String>;
}

impl<T: Display> ToTermTree for Tree<T> {
    fn to_tree_string(&self) -> TermTree<String> {
        self.subtree_string(self.root(), |node| node.payload().to_string())
    }

    fn to_layout_tree(&self) -> TermTree<String> {
        self.subtree_string(self.root(), |node| {
            format!("{} ({:.2}, {:.2})", node.payload(), node.x(), node.y())
        })
    }
}

impl<T> Tree<T> {
    /// Render the subtree under `start` with `label` applied to every node.
    pub fn subtree_string<F>(&self, start: NodeId, label: F) -> TermTree<String>
    where
        F: Fn(&Node<T>) -> String,
    {
        fn build<T, F>(tree: &Tree<T>, id: NodeId, label: &F) -> TermTree<String>
        where
            F: Fn(&Node<T>) -> String,
        {
            match tree.node(id) {
                Some(node) => {
                    let leaves: Vec<_> = node
                        .children()
                        .iter()
                        .map(|&child| build(tree, child, label))
                        .collect();
                    TermTree::new(label(node)).with_leaves(leaves)
                }
                None => TermTree::new(format!("<stale {}>", id)),
            }
        }

        build(self, start, &label)
    }
}
