#![allow(dead_code)]

use std::collections::HashMap;

use tidytree::{NodeId, Tree};

/// The 16-node reference tree.
///
/// ```text
/// a1 -> {b2, c5, d6}
/// b2 -> {e3, f4}
/// d6 -> {g7, h10, i11}
/// g7 -> {j8, k9}
/// h10 -> {l12}
/// i11 -> {m13, n14, o15, p16}
/// ```
pub fn reference_tree() -> (Tree<&'static str>, HashMap<&'static str, NodeId>) {
    let edges = [
        ("a1", "b2"),
        ("a1", "c5"),
        ("a1", "d6"),
        ("b2", "e3"),
        ("b2", "f4"),
        ("d6", "g7"),
        ("d6", "h10"),
        ("d6", "i11"),
        ("g7", "j8"),
        ("g7", "k9"),
        ("h10", "l12"),
        ("i11", "m13"),
        ("i11", "n14"),
        ("i11", "o15"),
        ("i11", "p16"),
    ];
    let mut tree = Tree::new("a1");
    let mut ids = HashMap::new();
    ids.insert("a1", tree.root());
    for (parent, child) in edges {
        let id = tree.add_child(ids[parent], child).unwrap();
        ids.insert(child, id);
    }
    (tree, ids)
}

/// Deterministic linear congruential generator for shape-varied test trees.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// Random tree with `size` nodes; each new node hangs under an earlier one.
pub fn random_tree(seed: u64, size: usize) -> Tree<usize> {
    let mut rng = Lcg::new(seed);
    let mut tree = Tree::new(0);
    let mut ids = vec![tree.root()];
    for label in 1..size {
        // bias towards recent nodes to get deep, ragged shapes
        let parent = if rng.next_below(2) == 0 {
            ids[rng.next_below(ids.len())]
        } else {
            ids[ids.len() - 1 - rng.next_below(ids.len().min(4))]
        };
        ids.push(tree.add_child(parent, label).unwrap());
    }
    tree
}

/// Nodes grouped per depth, each level ordered left to right.
pub fn levels<T>(tree: &Tree<T>) -> Vec<Vec<NodeId>> {
    let mut levels: Vec<Vec<NodeId>> = Vec::new();
    for (id, node) in tree.iter() {
        if levels.len() <= node.depth() {
            levels.resize_with(node.depth() + 1, Vec::new);
        }
        levels[node.depth()].push(id);
    }
    levels
}

pub fn x_of<T>(tree: &Tree<T>, id: NodeId) -> f64 {
    tree.get(id).unwrap().x()
}
