use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Rotates a vector 90 degrees counter-clockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Rotates a vector 90 degrees clockwise, giving the right-hand normal of a heading.
pub fn right_normal(vec: Vector2d) -> Vector2d {
    Vector2d::new(vec.y, -vec.x)
}

/// Normalises a vector, or returns `None` if it has no usable length.
pub fn try_normalize(vec: Vector2d) -> Option<Vector2d> {
    let mag = vec.magnitude();
    if mag.is_finite() && mag > 1e-9 {
        Some(vec / mag)
    } else {
        None
    }
}

/// The unsigned angle between two unit vectors, in radians within `[0, π]`.
pub fn turn_angle(from: Vector2d, to: Vector2d) -> f64 {
    from.dot(to).clamp(-1.0, 1.0).acos()
}

/// The signed angle from one vector to another, positive when turning counter-clockwise.
pub fn signed_turn(from: Vector2d, to: Vector2d) -> f64 {
    from.perp_dot(to).atan2(from.dot(to))
}

/// The arithmetic mean of a set of points.
pub fn mean_point(points: &[Point2d]) -> Option<Point2d> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2d::zero(), |acc, p| acc + p.to_vec());
    Some(Point2d::from_vec(sum / points.len() as f64))
}

/// Returns `value` or `fallback` when `value` is not finite.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
