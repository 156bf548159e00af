//! Stack-based traversals over a [`Tree`] arena.

use tracing::instrument;

use crate::domain::node::{Node, NodeId};
use crate::domain::tree::Tree;

/// Pre-order, left-to-right traversal.
pub struct TreeIterator<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> TreeIterator<'a, T> {
    #[instrument(level = "trace", skip(tree))]
    pub(crate) fn new(tree: &'a Tree<T>, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (NodeId, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.node(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current, node));
            }
        }
        None
    }
}

/// Post-order, left-to-right traversal: children before their parent.
pub struct PostOrderIterator<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<(NodeId, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    #[instrument(level = "trace", skip(tree))]
    pub(crate) fn new(tree: &'a Tree<T>, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (NodeId, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.node(current) {
                if visited {
                    return Some((current, node));
                }
                self.stack.push((current, true));
                for &child in node.children.iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}
