//! Walker's tidy tree layout with the Buchheim, Jünger & Leipert linear-time
//! improvement ("Improving Walker's Algorithm to Run in Linear Time", 2002).
//!
//! The first pass runs post-order and computes for every node a preliminary
//! x relative to its subtree, merging the right contour of the left siblings
//! with the left contour of each new subtree. Threads let the contour walk
//! skip over finished subtrees, and the `shift`/`change` accumulators spread a
//! subtree move over the siblings in between without touching them one by
//! one. The second pass runs pre-order and sums the modifiers into final
//! coordinates.
//!
//! Both passes use explicit stacks so tree depth is bounded by memory, not by
//! the call stack.

use tracing::{debug, instrument, trace};

use crate::domain::node::LayoutState;
use crate::domain::{NodeId, Tree, TreeError, TreeResult};

/// Separation used by [`Tree::layout_default`].
pub const DEFAULT_DISTANCE: f64 = 1.0;

impl<T> Tree<T> {
    /// Compute x/y coordinates for every node reachable from the root.
    ///
    /// `distance` is the minimum separation between adjacent nodes on the same
    /// level. Every call starts from scratch, so running it twice on an
    /// unchanged tree yields identical coordinates. After an error the layout
    /// fields are not meaningful.
    #[instrument(level = "debug", skip(self))]
    pub fn layout(&mut self, distance: f64) -> TreeResult<()> {
        if !(distance > 0.0 && distance.is_finite()) {
            return Err(TreeError::InvalidArgument(format!(
                "distance must be positive and finite, got {}",
                distance
            )));
        }
        let count = self.validate()?;

        let mut walker = Walker {
            tree: self,
            distance,
        };
        walker.first_walk();
        walker.second_walk();
        debug!("layout: placed {} nodes", count);
        Ok(())
    }

    /// Layout with [`DEFAULT_DISTANCE`].
    pub fn layout_default(&mut self) -> TreeResult<()> {
        self.layout(DEFAULT_DISTANCE)
    }
}

/// Pending node in the first pass.
struct Frame {
    node: NodeId,
    next_child: usize,
    default_ancestor: Option<NodeId>,
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            next_child: 0,
            default_ancestor: None,
        }
    }
}

/// One layout run over a validated tree.
///
/// Node lookups index the arena directly: `Tree::validate` has already
/// checked that every reachable handle is live.
struct Walker<'a, T> {
    tree: &'a mut Tree<T>,
    distance: f64,
}

impl<'a, T> Walker<'a, T> {
    fn children(&self, v: NodeId) -> &[NodeId] {
        &self.tree.arena[v.index].children
    }

    fn parent(&self, v: NodeId) -> Option<NodeId> {
        self.tree.arena[v.index].parent
    }

    fn left_sibling(&self, v: NodeId) -> Option<NodeId> {
        self.tree.arena[v.index].left_sibling
    }

    fn number(&self, v: NodeId) -> usize {
        self.tree.arena[v.index].number
    }

    fn prelim(&self, v: NodeId) -> f64 {
        self.tree.arena[v.index].layout.prelim
    }

    fn modifier(&self, v: NodeId) -> f64 {
        self.tree.arena[v.index].layout.modifier
    }

    fn ancestor_of(&self, v: NodeId) -> NodeId {
        self.tree.arena[v.index].layout.ancestor.unwrap_or(v)
    }

    fn state_mut(&mut self, v: NodeId) -> &mut LayoutState {
        &mut self.tree.arena[v.index].layout
    }

    fn next_left(&self, v: NodeId) -> Option<NodeId> {
        self.tree.next_left(v)
    }

    fn next_right(&self, v: NodeId) -> Option<NodeId> {
        self.tree.next_right(v)
    }

    /// Post-order pass assigning `prelim` and `modifier`.
    ///
    /// A child is apportioned as soon as its own subtree is finished and
    /// before its right sibling is entered, which is the order the recursive
    /// formulation produces.
    fn first_walk(&mut self) {
        let root = self.tree.root();
        self.state_mut(root).reset();
        let mut stack = vec![Frame::new(root)];

        while let Some(frame) = stack.last_mut() {
            let v = frame.node;
            if let Some(&child) = self.tree.arena[v.index].children.get(frame.next_child) {
                if frame.next_child == 0 {
                    frame.default_ancestor = Some(child);
                }
                frame.next_child += 1;
                self.state_mut(child).reset();
                stack.push(Frame::new(child));
                continue;
            }

            stack.pop();
            self.place(v);
            if let Some(parent_frame) = stack.last_mut() {
                let default_ancestor = parent_frame.default_ancestor.unwrap_or(v);
                parent_frame.default_ancestor = Some(self.apportion(v, default_ancestor));
            }
        }
    }

    /// Settle `v` once all of its children are placed and apportioned.
    fn place(&mut self, v: NodeId) {
        let distance = self.distance;
        let left_prelim = self.left_sibling(v).map(|w| self.prelim(w));

        let children = self.children(v);
        let Some((first, last)) = children.first().copied().zip(children.last().copied()) else {
            self.state_mut(v).prelim = left_prelim.map_or(0.0, |p| p + distance);
            return;
        };

        self.execute_shifts(v);
        let midpoint = 0.5 * (self.prelim(first) + self.prelim(last));
        let state = self.state_mut(v);
        match left_prelim {
            Some(p) => {
                state.prelim = p + distance;
                state.modifier = state.prelim - midpoint;
            }
            None => state.prelim = midpoint,
        }
    }

    /// Push the subtree of `v` clear of its left siblings' subtrees.
    ///
    /// Walks the inside contours (`v` leftward, left sibling rightward) and
    /// the outside contours level by level, carrying modifier sums for each.
    /// Returns the default ancestor for the next sibling.
    fn apportion(&mut self, v: NodeId, mut default_ancestor: NodeId) -> NodeId {
        let Some(w) = self.left_sibling(v) else {
            return default_ancestor;
        };
        let Some(leftmost) = self
            .parent(v)
            .and_then(|parent| self.children(parent).first().copied())
        else {
            return default_ancestor;
        };

        // inside/outside contour nodes; `plus` is v's side, `minus` the left side
        let mut v_ip = v;
        let mut v_op = v;
        let mut v_im = w;
        let mut v_om = leftmost;
        let mut s_ip = self.modifier(v_ip);
        let mut s_op = self.modifier(v_op);
        let mut s_im = self.modifier(v_im);
        let mut s_om = self.modifier(v_om);

        while let (Some(next_im), Some(next_ip)) = (self.next_right(v_im), self.next_left(v_ip)) {
            let (Some(next_om), Some(next_op)) = (self.next_left(v_om), self.next_right(v_op))
            else {
                break;
            };
            v_im = next_im;
            v_ip = next_ip;
            v_om = next_om;
            v_op = next_op;
            self.state_mut(v_op).ancestor = Some(v);

            let shift = (self.prelim(v_im) + s_im) - (self.prelim(v_ip) + s_ip) + self.distance;
            if shift > 0.0 {
                let ancestor = self.ancestor(v_im, v, default_ancestor);
                self.move_subtree(ancestor, v, shift);
                s_ip += shift;
                s_op += shift;
            }
            s_im += self.modifier(v_im);
            s_ip += self.modifier(v_ip);
            s_om += self.modifier(v_om);
            s_op += self.modifier(v_op);
        }

        if let Some(thread) = self.next_right(v_im) {
            if self.next_right(v_op).is_none() {
                let state = self.state_mut(v_op);
                state.thread = Some(thread);
                state.modifier += s_im - s_op;
                trace!("apportion: right thread {} -> {}", v_op, thread);
            }
        }
        if let Some(thread) = self.next_left(v_ip) {
            if self.next_left(v_om).is_none() {
                let state = self.state_mut(v_om);
                state.thread = Some(thread);
                state.modifier += s_ip - s_om;
                default_ancestor = v;
                trace!("apportion: left thread {} -> {}", v_om, thread);
            }
        }
        default_ancestor
    }

    /// The sibling of `v` that the contour node `v_i` belongs to, if it has one.
    fn ancestor(&self, v_i: NodeId, v: NodeId, default_ancestor: NodeId) -> NodeId {
        let candidate = self.ancestor_of(v_i);
        if self.parent(candidate) == self.parent(v) {
            candidate
        } else {
            default_ancestor
        }
    }

    /// Shift the subtree at `w_p` right by `shift` and queue the proportional
    /// share for the siblings strictly between `w_m` and `w_p`.
    fn move_subtree(&mut self, w_m: NodeId, w_p: NodeId, shift: f64) {
        let subtrees = self.number(w_p).saturating_sub(self.number(w_m)).max(1) as f64;
        trace!("move_subtree: {} by {} over {} subtrees", w_p, shift, subtrees);

        let right = self.state_mut(w_p);
        right.change -= shift / subtrees;
        right.shift += shift;
        right.prelim += shift;
        right.modifier += shift;
        self.state_mut(w_m).change += shift / subtrees;
    }

    /// Replay queued shifts on the children of `v`, right to left.
    fn execute_shifts(&mut self, v: NodeId) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let count = self.children(v).len();
        for i in (0..count).rev() {
            let w = self.children(v)[i];
            let state = self.state_mut(w);
            state.prelim += shift;
            state.modifier += shift;
            change += state.change;
            shift += state.shift + change;
        }
    }

    /// Pre-order pass turning preliminary offsets into final x coordinates.
    ///
    /// The root starts with modifier `-prelim` so it lands on x = 0.
    fn second_walk(&mut self) {
        let root = self.tree.root();
        let mut stack = vec![(root, -self.prelim(root))];
        while let Some((v, m)) = stack.pop() {
            let state = self.state_mut(v);
            state.x = state.prelim + m;
            let below = m + state.modifier;
            let node = &self.tree.arena[v.index];
            stack.extend(node.children.iter().map(|&child| (child, below)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_single_root_when_layout_then_root_sits_at_origin() {
        let mut tree = Tree::new(());
        tree.layout(1.0).unwrap();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.x(), 0.0);
        assert_eq!(root.y(), 0.0);
    }

    #[test]
    fn given_two_leaves_when_layout_then_centered_under_parent() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        tree.layout(2.0).unwrap();

        assert_eq!(tree.get(a).unwrap().x(), -1.0);
        assert_eq!(tree.get(b).unwrap().x(), 1.0);
    }

    #[test]
    fn given_leaves_when_first_walk_then_prelim_steps_by_distance() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let ids: Vec<_> = (0..3).map(|_| tree.add_child(root, "c").unwrap()).collect();
        tree.layout(0.5).unwrap();

        let prelims: Vec<f64> = ids.iter().map(|&id| tree.get(id).unwrap().prelim()).collect();
        assert_eq!(prelims, vec![0.0, 0.5, 1.0]);
        assert_eq!(tree.get(root).unwrap().prelim(), 0.5);
    }

    #[test]
    fn given_uneven_subtrees_when_layout_then_middle_sibling_is_spread_evenly() {
        // r -> {a, b, c}; a and c have wide subtrees that push c right,
        // b must end halfway between a and c
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        let c = tree.add_child(root, "c").unwrap();
        for _ in 0..3 {
            tree.add_child(a, "a'").unwrap();
            tree.add_child(c, "c'").unwrap();
        }
        tree.layout(1.0).unwrap();

        let xa = tree.get(a).unwrap().x();
        let xb = tree.get(b).unwrap().x();
        let xc = tree.get(c).unwrap().x();
        assert!((xb - xa - (xc - xb)).abs() < 1e-9);
        assert!(xc - xa >= 3.0 - 1e-9);
    }
}
