//! Position query: layout coordinates translated and scaled for a drawing layer.

use serde::{Deserialize, Serialize};

use crate::domain::{Node, NodeId, Tree, TreeResult};

/// Per-axis scale applied to layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scale {
    /// Same factor on both axes
    Uniform(f64),
    /// Separate factors for x and y
    Axes { x: f64, y: f64 },
}

impl Scale {
    pub fn x(&self) -> f64 {
        match *self {
            Scale::Uniform(s) => s,
            Scale::Axes { x, .. } => x,
        }
    }

    pub fn y(&self) -> f64 {
        match *self {
            Scale::Uniform(s) => s,
            Scale::Axes { y, .. } => y,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Uniform(1.0)
    }
}

impl From<f64> for Scale {
    fn from(s: f64) -> Self {
        Scale::Uniform(s)
    }
}

impl From<(f64, f64)> for Scale {
    fn from((x, y): (f64, f64)) -> Self {
        Scale::Axes { x, y }
    }
}

/// Axis-aligned extent of a laid-out tree in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl<T> Node<T> {
    /// Integer position: `origin + ceil(coordinate * scale)` on each axis.
    ///
    /// The scaled value is converted with `as i64`: it saturates at the `i64`
    /// bounds and a NaN coordinate or scale becomes 0. Adding the origin
    /// saturates as well.
    pub fn position(&self, origin: (i64, i64), scale: impl Into<Scale>) -> (i64, i64) {
        let scale = scale.into();
        (
            origin.0.saturating_add((self.x() * scale.x()).ceil() as i64),
            origin.1.saturating_add((self.y() * scale.y()).ceil() as i64),
        )
    }

    /// Continuous position: `origin + coordinate * scale` on each axis.
    pub fn position_f(&self, origin: (f64, f64), scale: impl Into<Scale>) -> (f64, f64) {
        let scale = scale.into();
        (
            origin.0 + self.x() * scale.x(),
            origin.1 + self.y() * scale.y(),
        )
    }
}

impl<T> Tree<T> {
    /// Integer position of `node`, see [`Node::position`].
    pub fn position(
        &self,
        node: NodeId,
        origin: (i64, i64),
        scale: impl Into<Scale>,
    ) -> TreeResult<(i64, i64)> {
        Ok(self.get(node)?.position(origin, scale))
    }

    /// Continuous position of `node`, see [`Node::position_f`].
    pub fn position_f(
        &self,
        node: NodeId,
        origin: (f64, f64),
        scale: impl Into<Scale>,
    ) -> TreeResult<(f64, f64)> {
        Ok(self.get(node)?.position_f(origin, scale))
    }

    /// Integer positions of all registered nodes, in registry order.
    pub fn positions(
        &self,
        origin: (i64, i64),
        scale: impl Into<Scale>,
    ) -> Vec<(NodeId, (i64, i64))> {
        let scale = scale.into();
        self.nodes()
            .map(|(id, node)| (id, node.position(origin, scale)))
            .collect()
    }

    /// Extent of the registered nodes in layout units.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes().map(|(_, node)| (node.x(), node.y())).fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Bounds {
                    min_x: x,
                    max_x: x,
                    min_y: y,
                    max_y: y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x),
                    max_x: b.max_x.max(x),
                    min_y: b.min_y.min(y),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }
}
