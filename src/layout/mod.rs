//! Layout layer: coordinate computation and position queries.

pub mod position;
pub mod walker;

pub use position::{Bounds, Scale};
pub use walker::DEFAULT_DISTANCE;
