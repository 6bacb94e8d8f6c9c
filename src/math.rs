//! Mathematical structs and functions.
//!
//! Everything works in the flat XZ plane. `cgmath`'s `y` component holds the
//! world `z` coordinate.

use cgmath::{Point2, Vector2};
pub use kernel::{
    arc_segments, edge_fillet_arc, line_intersection, sample_arc, FilletArc, FilletRequest,
    LineHit,
};
pub use polygon::*;
pub use tile::{normalize_point, TileCoord};
pub use util::*;

mod kernel;
mod polygon;
mod tile;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
