use std::fmt;

use generational_arena::Index;

/// Handle to a node stored in a [`Tree`](crate::domain::Tree) arena.
///
/// Handles are generational: once a node leaves the arena its handle is stale
/// and every lookup through it fails instead of hitting a recycled slot.
/// A handle also carries the id of the tree that issued it, so it never
/// resolves in another tree. Clones of a tree share its id and its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) tree: u64,
    pub(crate) index: Index,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.index.into_raw_parts();
        write!(f, "#{}:{}@{}", slot, generation, self.tree)
    }
}

/// Scratch state written by the layout passes.
///
/// Meaningful only after [`Tree::layout`](crate::domain::Tree::layout) completed;
/// every pass resets it before use.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutState {
    /// Offset relative to the subtree before ancestor modifiers apply
    pub prelim: f64,
    /// Offset applied to the whole subtree in the second pass
    pub modifier: f64,
    /// Contour continuation for nodes without children
    pub thread: Option<NodeId>,
    /// Attribution target during apportion, `None` means the node itself
    pub ancestor: Option<NodeId>,
    pub shift: f64,
    pub change: f64,
    /// Final horizontal coordinate
    pub x: f64,
}

impl LayoutState {
    pub(crate) fn reset(&mut self) {
        *self = Self {
            x: self.x,
            ..Self::default()
        };
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Opaque user data, never interpreted by the layout
    pub(crate) payload: T,
    /// Parent node, `None` for the root and for detached fragments
    pub(crate) parent: Option<NodeId>,
    /// Ordered children, insertion order drives the layout
    pub(crate) children: Vec<NodeId>,
    /// Preceding sibling, `None` for a first child
    pub(crate) left_sibling: Option<NodeId>,
    /// Zero-based position among siblings
    pub(crate) number: usize,
    /// Distance from the top of the (sub)tree this node hangs in
    pub(crate) depth: usize,
    /// Explicit y coordinate overriding the depth default
    pub(crate) pinned_y: Option<f64>,
    /// Reachable from the tree root and listed in the registry
    pub(crate) registered: bool,
    pub(crate) layout: LayoutState,
}

impl<T> Node<T> {
    pub(crate) fn new(payload: T) -> Self {
        Self {
            payload,
            parent: None,
            children: Vec::new(),
            left_sibling: None,
            number: 0,
            depth: 0,
            pinned_y: None,
            registered: false,
            layout: LayoutState::default(),
        }
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    pub fn left_sibling(&self) -> Option<NodeId> {
        self.left_sibling
    }

    /// Position among siblings, 0 for a first child or a root.
    pub fn index(&self) -> usize {
        self.number
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Horizontal layout coordinate, 0.0 until a layout pass ran.
    pub fn x(&self) -> f64 {
        self.layout.x
    }

    /// Vertical layout coordinate: the pinned value if any, else the depth.
    pub fn y(&self) -> f64 {
        self.pinned_y.unwrap_or(self.depth as f64)
    }

    pub fn prelim(&self) -> f64 {
        self.layout.prelim
    }

    pub fn modifier(&self) -> f64 {
        self.layout.modifier
    }

    /// Contour successor when the node has no children.
    pub fn thread(&self) -> Option<NodeId> {
        self.layout.thread
    }
}
