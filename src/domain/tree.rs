//! Arena-backed rooted, ordered tree with cached sibling links.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::Arena;
use tracing::{debug, instrument, trace};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::iter::{PostOrderIterator, TreeIterator};
use crate::domain::node::{Node, NodeId};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Rooted, ordered tree.
///
/// Every node lives in one generational arena; the tree owns them through the
/// arena and the parent→children order. Parent, left-sibling, thread and
/// ancestor links are plain [`NodeId`] lookups.
///
/// The registry lists, in insertion order, exactly the nodes reachable from
/// the root. All mutation goes through the tree, which keeps the registry and
/// the sibling caches (`left_sibling`, `index`, `depth`) in sync.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    /// Stamped into every handle this tree issues
    id: u64,
    pub(crate) arena: Arena<Node<T>>,
    root: NodeId,
    registry: Vec<NodeId>,
}

impl<T> Tree<T> {
    /// Create a tree holding a single root node.
    pub fn new(payload: T) -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let mut arena = Arena::new();
        let mut node = Node::new(payload);
        node.registered = true;
        let root = NodeId {
            tree: id,
            index: arena.insert(node),
        };
        Self {
            id,
            arena,
            root,
            registry: vec![root],
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node; `None` for stale handles and handles of other trees.
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        if id.tree != self.id {
            return None;
        }
        self.arena.get(id.index)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        if id.tree != self.id {
            return None;
        }
        self.arena.get_mut(id.index)
    }

    /// Look up a node, failing on stale or foreign handles.
    pub fn get(&self, id: NodeId) -> TreeResult<&Node<T>> {
        self.node(id).ok_or(TreeError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node<T>> {
        self.node_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    pub fn payload(&self, id: NodeId) -> TreeResult<&T> {
        self.get(id).map(Node::payload)
    }

    pub fn payload_mut(&mut self, id: NodeId) -> TreeResult<&mut T> {
        self.get_mut(id).map(|node| &mut node.payload)
    }

    /// True if the handle points at a live node in this arena, attached or not.
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.id && self.arena.contains(id.index)
    }

    /// True if the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.registered)
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    /// Nodes held in the arena, detached fragments included.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// All nodes reachable from the root, in the order they were attached.
    pub fn registry(&self) -> &[NodeId] {
        &self.registry
    }

    /// Registered nodes with their data, in registry order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> + '_ {
        self.registry
            .iter()
            .filter_map(move |&id| self.node(id).map(|node| (id, node)))
    }

    /// Pre-order traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_, T> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree under `start`.
    pub fn iter_from(&self, start: NodeId) -> TreeIterator<'_, T> {
        TreeIterator::new(self, start)
    }

    /// Post-order traversal from the root.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self, self.root)
    }

    /// Number of levels in the tree; a lone root has height 1.
    #[instrument(level = "debug", skip(self))]
    pub fn height(&self) -> usize {
        self.iter()
            .map(|(_, node)| node.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Nodes without children, left to right.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Contour successor on the left side: first child, else the thread.
    pub fn next_left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .and_then(|node| node.first_child().or(node.layout.thread))
    }

    /// Contour successor on the right side: last child, else the thread.
    pub fn next_right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .and_then(|node| node.last_child().or(node.layout.thread))
    }

    /// Create a detached node, to be spliced in later with [`Tree::add_node`].
    #[instrument(level = "trace", skip_all)]
    pub fn create_node(&mut self, payload: T) -> NodeId {
        let id = NodeId {
            tree: self.id,
            index: self.arena.insert(Node::new(payload)),
        };
        trace!("create_node: {}", id);
        id
    }

    /// Append a new child holding `payload` to `parent`.
    #[instrument(level = "debug", skip(self, payload))]
    pub fn add_child(&mut self, parent: NodeId, payload: T) -> TreeResult<NodeId> {
        self.get(parent)?;
        let id = self.create_node(payload);
        self.attach(parent, id);
        Ok(id)
    }

    /// Append a new child holding `payload` to the root.
    pub fn add_child_to_root(&mut self, payload: T) -> NodeId {
        let id = self.create_node(payload);
        self.attach(self.root, id);
        id
    }

    /// Append an existing detached node (and whatever hangs below it) to `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_node(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.get(parent)?;
        let candidate = self.get(node)?;
        if candidate.parent.is_some() || node == self.root {
            return Err(TreeError::AlreadyAttached(node));
        }
        if !self.is_attached(parent) && self.top_of(parent) == node {
            return Err(TreeError::InvalidArgument(format!(
                "attaching {} under {} would make it its own ancestor",
                node, parent
            )));
        }
        self.attach(parent, node);
        Ok(())
    }

    /// Move every node of `subtree` into this tree and attach its root under `parent`.
    #[instrument(level = "debug", skip(self, subtree))]
    pub fn graft(&mut self, parent: NodeId, mut subtree: Tree<T>) -> TreeResult<NodeId> {
        self.get(parent)?;
        let start = subtree.root;
        let top = Self::move_fragment(&mut subtree.arena, start, self)
            .ok_or_else(|| TreeError::InvalidTree(format!("subtree root {} is missing", start)))?;
        self.attach(parent, top);
        debug!("graft: attached {} nodes under {}", self.iter_from(top).count(), parent);
        Ok(top)
    }

    /// Detach `node` from `parent`.
    ///
    /// The remaining children are renumbered from 0 and their left-sibling
    /// chain is rebuilt. The removed subtree stays in the arena as a detached
    /// fragment rooted at `node`: it can be attached again with
    /// [`Tree::add_node`], moved out with [`Tree::split_off`] or freed with
    /// [`Tree::discard`]. Until then it keeps its arena slots.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        let position = self
            .get(parent)?
            .children
            .iter()
            .position(|&child| child == node)
            .ok_or(TreeError::NotFound { node, parent })?;

        let removed: HashSet<NodeId> = self.iter_from(node).map(|(id, _)| id).collect();

        self.get_mut(parent)?.children.remove(position);
        self.relink_children(parent, position);

        let detached = self.get_mut(node)?;
        detached.parent = None;
        detached.left_sibling = None;
        detached.number = 0;
        self.rebase_depths(node, 0);

        for &id in &removed {
            if let Some(node) = self.node_mut(id) {
                node.registered = false;
            }
        }
        self.registry.retain(|id| !removed.contains(id));
        debug!(
            "remove_child: detached {} nodes, {} remain registered",
            removed.len(),
            self.registry.len()
        );
        Ok(())
    }

    /// Move a detached fragment out of this arena into a standalone tree.
    ///
    /// Handles into the fragment become stale in `self`.
    #[instrument(level = "debug", skip(self))]
    pub fn split_off(&mut self, node: NodeId) -> TreeResult<Tree<T>> {
        let candidate = self.get(node)?;
        if candidate.parent.is_some() || node == self.root {
            return Err(TreeError::AlreadyAttached(node));
        }
        let top = self
            .arena
            .remove(node.index)
            .ok_or(TreeError::UnknownNode(node))?;

        let mut fragment = Tree::new(top.payload);
        let fragment_root = fragment.root;
        if let Some(root) = fragment.node_mut(fragment_root) {
            root.pinned_y = top.pinned_y;
        }
        for child in top.children {
            if let Some(moved) = Self::move_fragment(&mut self.arena, child, &mut fragment) {
                fragment.attach(fragment_root, moved);
            }
        }
        debug!("split_off: fragment holds {} nodes", fragment.node_count());
        Ok(fragment)
    }

    /// Free a detached fragment and everything below it.
    ///
    /// Returns the number of nodes dropped; their handles become stale.
    #[instrument(level = "debug", skip(self))]
    pub fn discard(&mut self, node: NodeId) -> TreeResult<usize> {
        let candidate = self.get(node)?;
        if candidate.parent.is_some() || node == self.root {
            return Err(TreeError::AlreadyAttached(node));
        }
        let doomed: Vec<NodeId> = self.iter_from(node).map(|(id, _)| id).collect();
        for id in &doomed {
            self.arena.remove(id.index);
        }
        debug!("discard: freed {} nodes", doomed.len());
        Ok(doomed.len())
    }

    /// Fix the y coordinate of a node instead of deriving it from depth.
    pub fn set_y(&mut self, id: NodeId, y: f64) -> TreeResult<()> {
        self.get_mut(id)?.pinned_y = Some(y);
        Ok(())
    }

    /// Return a node's y coordinate to the depth default.
    pub fn clear_y(&mut self, id: NodeId) -> TreeResult<()> {
        self.get_mut(id)?.pinned_y = None;
        Ok(())
    }

    /// Check the structure reachable from the root.
    ///
    /// Fails on cycles, nodes shared between parents, dangling handles,
    /// parent/children disagreement and stale sibling caches. Returns the
    /// number of reachable nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> TreeResult<usize> {
        let root = self
            .node(self.root)
            .ok_or_else(|| TreeError::InvalidTree(format!("root {} is missing", self.root)))?;
        if root.parent.is_some() {
            return Err(TreeError::InvalidTree(format!("root {} has a parent", self.root)));
        }

        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(TreeError::InvalidTree(format!(
                    "node {} is reachable twice (cycle or shared child)",
                    id
                )));
            }
            let node = self
                .node(id)
                .ok_or_else(|| TreeError::InvalidTree(format!("dangling child handle {}", id)))?;

            let mut left = None;
            for (number, &child_id) in node.children.iter().enumerate() {
                let child = self.node(child_id).ok_or_else(|| {
                    TreeError::InvalidTree(format!("dangling child handle {}", child_id))
                })?;
                if child.parent != Some(id) {
                    return Err(TreeError::InvalidTree(format!(
                        "child {} of {} points at parent {:?}",
                        child_id, id, child.parent
                    )));
                }
                if child.number != number || child.left_sibling != left {
                    return Err(TreeError::InvalidTree(format!(
                        "stale sibling cache on {}",
                        child_id
                    )));
                }
                left = Some(child_id);
                stack.push(child_id);
            }
        }
        Ok(visited.len())
    }

    /// Topmost ancestor of `id`: the root if attached, else the fragment top.
    fn top_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).and_then(|node| node.parent) {
            current = parent;
        }
        current
    }

    /// Link a valid detached `node` as last child of a valid `parent`.
    fn attach(&mut self, parent: NodeId, node: NodeId) {
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        let left_sibling = parent_node.last_child();
        let number = parent_node.children.len();
        let depth = parent_node.depth + 1;
        parent_node.children.push(node);

        if let Some(child) = self.node_mut(node) {
            child.parent = Some(parent);
            child.left_sibling = left_sibling;
            child.number = number;
        }
        self.rebase_depths(node, depth);

        if self.is_attached(parent) {
            let reachable: Vec<NodeId> = self.iter_from(node).map(|(id, _)| id).collect();
            for &id in &reachable {
                if let Some(entry) = self.node_mut(id) {
                    entry.registered = true;
                }
            }
            self.registry.extend(reachable);
        }
        trace!("attach: {} under {} at index {}", node, parent, number);
    }

    /// Renumber children of `parent` from `from` on and rebuild their left-sibling links.
    fn relink_children(&mut self, parent: NodeId, from: usize) {
        let Some(children) = self.node(parent).map(|node| node.children.clone()) else {
            return;
        };
        for (number, &child) in children.iter().enumerate().skip(from) {
            let left_sibling = number.checked_sub(1).map(|left| children[left]);
            if let Some(node) = self.node_mut(child) {
                node.left_sibling = left_sibling;
                node.number = number;
            }
        }
    }

    fn rebase_depths(&mut self, start: NodeId, depth: usize) {
        let mut stack = vec![(start, depth)];
        while let Some((id, depth)) = stack.pop() {
            if let Some(node) = self.node_mut(id) {
                node.depth = depth;
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
    }

    /// Move the subtree under `start` from `source` into `dest` as a detached fragment.
    fn move_fragment(
        source: &mut Arena<Node<T>>,
        start: NodeId,
        dest: &mut Tree<T>,
    ) -> Option<NodeId> {
        let mut top = None;
        let mut stack = vec![(start, None)];
        while let Some((old, new_parent)) = stack.pop() {
            let Some(Node {
                payload,
                children,
                pinned_y,
                ..
            }) = source.remove(old.index)
            else {
                continue;
            };
            let id = dest.create_node(payload);
            if let Some(node) = dest.node_mut(id) {
                node.pinned_y = pinned_y;
            }
            match new_parent {
                Some(parent) => dest.attach(parent, id),
                None => top = Some(id),
            }
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_corrupted_parent_link_when_validating_then_reports_invalid_tree() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        tree.node_mut(a).unwrap().parent = None;

        assert!(matches!(tree.validate(), Err(TreeError::InvalidTree(_))));
    }

    #[test]
    fn given_cycle_when_validating_then_reports_invalid_tree() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        // a lists the root as its child
        tree.node_mut(a).unwrap().children.push(root);

        assert!(matches!(tree.validate(), Err(TreeError::InvalidTree(_))));
    }

    #[test]
    fn given_stale_index_when_validating_then_reports_invalid_tree() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        tree.node_mut(b).unwrap().number = 5;

        assert!(matches!(tree.validate(), Err(TreeError::InvalidTree(_))));
    }

    #[test]
    fn given_consistent_tree_when_validating_then_counts_reachable_nodes() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        tree.add_child(a, "b").unwrap();
        tree.create_node("detached");

        assert_eq!(tree.validate(), Ok(3));
    }

    #[test]
    fn given_fragment_when_attaching_then_depths_are_rebased() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        let top = tree.create_node("x");
        let below = tree.create_node("y");
        tree.add_node(top, below).unwrap();
        assert_eq!(tree.get(below).unwrap().depth(), 1);

        tree.add_node(a, top).unwrap();

        assert_eq!(tree.get(top).unwrap().depth(), 2);
        assert_eq!(tree.get(below).unwrap().depth(), 3);
    }
}
