//! Line intersection, two-ray fillets and arc tessellation.

use super::{Point2d, Vector2d};
use cgmath::prelude::*;
use serde::Serialize;
use std::f64::consts::PI;

/// Rays whose directions are closer to parallel than this do not intersect.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Tangent points may sit this far behind a ray's origin and still count as forward.
const FORWARD_TOLERANCE: f64 = 1e-6;

/// The intersection of two lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineHit {
    /// The intersection point.
    pub point: Point2d,
    /// Signed distance along the first direction (in units of its length).
    pub t: f64,
    /// Signed distance along the second direction (in units of its length).
    pub u: f64,
}

/// Intersects the line through `p0` along `dir0` with the line through `p1` along `dir1`.
///
/// Returns `None` when the lines are parallel.
pub fn line_intersection(
    p0: Point2d,
    dir0: Vector2d,
    p1: Point2d,
    dir1: Vector2d,
) -> Option<LineHit> {
    let denom = dir0.perp_dot(dir1);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let delta = p1 - p0;
    let t = delta.perp_dot(dir1) / denom;
    let u = delta.perp_dot(dir0) / denom;
    let point = p0 + dir0 * t;
    if !(point.x.is_finite() && point.y.is_finite()) {
        return None;
    }
    Some(LineHit { point, t, u })
}

/// The inputs to [edge_fillet_arc].
#[derive(Clone, Copy, Debug)]
pub struct FilletRequest {
    /// Origin of the first ray.
    pub p0: Point2d,
    /// Unit direction of the first ray.
    pub dir0: Vector2d,
    /// Unit normal of the first ray pointing away from the fillet centre.
    pub out0: Vector2d,
    /// Origin of the second ray.
    pub p1: Point2d,
    /// Unit direction of the second ray.
    pub dir1: Vector2d,
    /// Unit normal of the second ray pointing away from the fillet centre.
    pub out1: Vector2d,
    /// The fillet radius.
    pub radius: f64,
}

/// A circular arc tangent to two rays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilletArc {
    #[serde(with = "crate::util::xz")]
    pub center: Point2d,
    pub radius: f64,
    /// Angle of `tangent0` around the centre.
    pub start_ang: f64,
    /// Unsigned sweep from `tangent0` to `tangent1`.
    pub span_ang: f64,
    /// Whether the sweep runs counter-clockwise.
    pub ccw: bool,
    #[serde(with = "crate::util::xz")]
    pub tangent0: Point2d,
    #[serde(with = "crate::util::xz")]
    pub tangent1: Point2d,
}

impl FilletArc {
    /// The point halfway along the arc.
    pub fn midpoint(&self) -> Point2d {
        let sign = if self.ccw { 1.0 } else { -1.0 };
        let ang = self.start_ang + sign * 0.5 * self.span_ang;
        self.center + Vector2d::new(ang.cos(), ang.sin()) * self.radius
    }

    /// The arc length.
    pub fn length(&self) -> f64 {
        self.radius * self.span_ang
    }
}

/// Solves for the circle of the given radius that is tangent to both rays, with its centre
/// on the side opposite each ray's `out` normal.
///
/// Returns `None` for a non-positive radius, parallel rays, or when a tangent point would
/// fall behind its ray's origin.
pub fn edge_fillet_arc(req: &FilletRequest) -> Option<FilletArc> {
    if !(req.radius.is_finite() && req.radius > 0.0) {
        return None;
    }

    // The centre c satisfies out0·c = out0·p0 − r and out1·c = out1·p1 − r.
    let (a, b) = (req.out0, req.out1);
    let det = a.perp_dot(b);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let k0 = a.dot(req.p0.to_vec()) - req.radius;
    let k1 = b.dot(req.p1.to_vec()) - req.radius;
    let center = Point2d::new((k0 * b.y - k1 * a.y) / det, (a.x * k1 - b.x * k0) / det);

    let tangent0 = center + a * req.radius;
    let tangent1 = center + b * req.radius;
    if (tangent0 - req.p0).dot(req.dir0) < -FORWARD_TOLERANCE
        || (tangent1 - req.p1).dot(req.dir1) < -FORWARD_TOLERANCE
    {
        return None;
    }

    let (v0, v1) = (tangent0 - center, tangent1 - center);
    let sweep = v0.perp_dot(v1).atan2(v0.dot(v1));
    if !sweep.is_finite() {
        return None;
    }
    Some(FilletArc {
        center,
        radius: req.radius,
        start_ang: v0.y.atan2(v0.x),
        span_ang: sweep.abs(),
        ccw: sweep > 0.0,
        tangent0,
        tangent1,
    })
}

/// Samples `segments + 1` points along an arc, from `tangent0` to `tangent1`.
pub fn sample_arc(arc: &FilletArc, segments: usize) -> Vec<Point2d> {
    let segments = segments.max(1);
    let sign = if arc.ccw { 1.0 } else { -1.0 };
    (0..=segments)
        .map(|i| {
            let ang = arc.start_ang + sign * arc.span_ang * (i as f64 / segments as f64);
            arc.center + Vector2d::new(ang.cos(), ang.sin()) * arc.radius
        })
        .collect()
}

/// The number of segments used to tessellate an arc with the given sweep.
pub fn arc_segments(span_ang: f64) -> usize {
    const STEP: f64 = PI / 24.0;
    ((span_ang / STEP).ceil() as usize).clamp(2, 48)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn perpendicular_lines_intersect() {
        let hit = line_intersection(
            Point2d::new(0.0, 0.0),
            Vector2d::new(1.0, 0.0),
            Point2d::new(5.0, -3.0),
            Vector2d::new(0.0, 1.0),
        )
        .unwrap();
        assert_approx_eq!(hit.point.x, 5.0);
        assert_approx_eq!(hit.point.y, 0.0);
        assert_approx_eq!(hit.t, 5.0);
        assert_approx_eq!(hit.u, 3.0);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let dir = Vector2d::new(1.0, 1.0).normalize();
        let (p0, p1) = (Point2d::new(0.0, 0.0), Point2d::new(0.0, 1.0));
        assert!(line_intersection(p0, dir, p1, dir).is_none());
    }

    #[test]
    fn quarter_fillet() {
        // Heading east along z=0, then arriving from the north along x=10.
        let arc = edge_fillet_arc(&FilletRequest {
            p0: Point2d::new(0.0, 0.0),
            dir0: Vector2d::new(1.0, 0.0),
            out0: Vector2d::new(0.0, -1.0),
            p1: Point2d::new(10.0, 10.0),
            dir1: Vector2d::new(0.0, -1.0),
            out1: Vector2d::new(1.0, 0.0),
            radius: 4.0,
        })
        .unwrap();
        assert_approx_eq!(arc.center.x, 6.0);
        assert_approx_eq!(arc.center.y, 4.0);
        assert_approx_eq!(arc.tangent0.x, 6.0);
        assert_approx_eq!(arc.tangent1.y, 4.0);
        assert_approx_eq!(arc.span_ang, std::f64::consts::FRAC_PI_2);
        assert!(arc.ccw);

        let pts = sample_arc(&arc, 8);
        assert_eq!(pts.len(), 9);
        assert_approx_eq!(pts[0].distance(arc.tangent0), 0.0);
        assert_approx_eq!(pts[8].distance(arc.tangent1), 0.0);
        for p in pts {
            assert_approx_eq!(p.distance(arc.center), 4.0);
        }
    }

    #[test]
    fn fillet_behind_ray_is_rejected() {
        let req = FilletRequest {
            p0: Point2d::new(0.0, 0.0),
            dir0: Vector2d::new(1.0, 0.0),
            out0: Vector2d::new(0.0, -1.0),
            p1: Point2d::new(10.0, 10.0),
            dir1: Vector2d::new(0.0, -1.0),
            out1: Vector2d::new(1.0, 0.0),
            radius: 20.0,
        };
        assert!(edge_fillet_arc(&req).is_none());
    }

    #[test]
    fn parallel_fillet_is_rejected() {
        let req = FilletRequest {
            p0: Point2d::new(0.0, 0.0),
            dir0: Vector2d::new(1.0, 0.0),
            out0: Vector2d::new(0.0, -1.0),
            p1: Point2d::new(0.0, 5.0),
            dir1: Vector2d::new(1.0, 0.0),
            out1: Vector2d::new(0.0, -1.0),
            radius: 1.0,
        };
        assert!(edge_fillet_arc(&req).is_none());
    }
}
