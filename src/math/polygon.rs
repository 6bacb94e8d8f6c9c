use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;
use serde::Serialize;

/// Points closer than this are treated as the same vertex.
const VERTEX_EPSILON: f64 = 1e-9;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aabb {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl Aabb {
    /// Computes the bounding box of a set of points.
    pub fn from_points(points: &[Point2d]) -> Self {
        points.iter().fold(
            Aabb {
                min_x: f64::INFINITY,
                min_z: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_z: f64::NEG_INFINITY,
            },
            |b, p| Aabb {
                min_x: b.min_x.min(p.x),
                min_z: b.min_z.min(p.y),
                max_x: b.max_x.max(p.x),
                max_z: b.max_z.max(p.y),
            },
        )
    }

    /// Returns true if the boxes overlap or touch.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }
}

/// The signed area of a polygon; positive when its vertices run counter-clockwise.
pub fn signed_area(ring: &[Point2d]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let sum: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    0.5 * sum
}

/// The area centroid of a polygon, falling back to the vertex mean for degenerate input.
pub fn centroid(ring: &[Point2d]) -> Option<Point2d> {
    let area = signed_area(ring);
    if area.abs() <= VERTEX_EPSILON {
        return super::mean_point(ring);
    }
    let (cx, cz) = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .fold((0.0, 0.0), |(cx, cz), (a, b)| {
            let cross = a.x * b.y - b.x * a.y;
            (cx + (a.x + b.x) * cross, cz + (a.y + b.y) * cross)
        });
    Some(Point2d::new(cx / (6.0 * area), cz / (6.0 * area)))
}

/// Projects a polygon onto an axis.
pub fn project_onto_axis(ring: &[Point2d], axis: Vector2d) -> Interval<f64> {
    ring.iter().map(|p| p.to_vec().dot(axis)).fold(
        Interval::new(f64::INFINITY, f64::NEG_INFINITY),
        |i, d| Interval::new(i.min.min(d), i.max.max(d)),
    )
}

/// Separating axis test: returns true if no axis separates the two convex polygons.
pub fn convex_overlap_on_axes(a: &[Point2d], b: &[Point2d], axes: &[Vector2d]) -> bool {
    axes.iter()
        .all(|axis| project_onto_axis(a, *axis).overlaps(&project_onto_axis(b, *axis)))
}

/// Clips `subject` against every edge of the convex, counter-clockwise polygon `clip`
/// (Sutherland–Hodgman). The result is the intersection of the two polygons.
pub fn clip_convex(subject: &[Point2d], clip: &[Point2d]) -> Vec<Point2d> {
    let mut output = subject.to_vec();
    for (&e0, &e1) in clip.iter().zip(clip.iter().cycle().skip(1)) {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let inside = |p: Point2d| (e1 - e0).perp_dot(p - e0) >= 0.0;
        for (&cur, &next) in input.iter().zip(input.iter().cycle().skip(1)) {
            match (inside(cur), inside(next)) {
                (true, true) => output.push(next),
                (true, false) => output.extend(edge_crossing(cur, next, e0, e1)),
                (false, true) => {
                    output.extend(edge_crossing(cur, next, e0, e1));
                    output.push(next);
                }
                (false, false) => {}
            }
        }
    }
    dedupe_ring(output)
}

fn edge_crossing(p0: Point2d, p1: Point2d, e0: Point2d, e1: Point2d) -> Option<Point2d> {
    let d = p1 - p0;
    let e = e1 - e0;
    let denom = e.perp_dot(d);
    if denom.abs() < 1e-15 {
        return None;
    }
    let t = e.perp_dot(e0 - p0) / denom;
    Some(p0 + d * t.clamp(0.0, 1.0))
}

/// Removes consecutive duplicate vertices, including a closing vertex equal to the first.
pub fn dedupe_ring(mut ring: Vec<Point2d>) -> Vec<Point2d> {
    ring.dedup_by(|b, a| a.distance(*b) <= VERTEX_EPSILON);
    while ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) <= VERTEX_EPSILON {
        ring.pop();
    }
    ring
}

/// Reverses the ring in place if it runs clockwise.
pub fn ensure_ccw(ring: &mut [Point2d]) {
    if signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Returns true if no two non-adjacent edges of the closed ring touch or cross.
pub fn is_simple(ring: &[Point2d]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let edge = |i: usize| (ring[i], ring[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 1)..n {
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a0, a1) = edge(i);
            let (b0, b1) = edge(j);
            if segments_touch(a0, a1, b0, b1) {
                return false;
            }
        }
    }
    true
}

fn segments_touch(a0: Point2d, a1: Point2d, b0: Point2d, b1: Point2d) -> bool {
    let orient = |p: Point2d, q: Point2d, r: Point2d| {
        let v = (q - p).perp_dot(r - p);
        if v.abs() <= 1e-12 {
            0
        } else {
            v.signum() as i32
        }
    };
    let on_segment = |p: Point2d, q: Point2d, r: Point2d| {
        r.x <= p.x.max(q.x) + 1e-12
            && r.x >= p.x.min(q.x) - 1e-12
            && r.y <= p.y.max(q.y) + 1e-12
            && r.y >= p.y.min(q.y) - 1e-12
    };
    let o1 = orient(a0, a1, b0);
    let o2 = orient(a0, a1, b1);
    let o3 = orient(b0, b1, a0);
    let o4 = orient(b0, b1, a1);
    if o1 != o2 && o3 != o4 && o1 * o2 <= 0 && o3 * o4 <= 0 {
        return true;
    }
    (o1 == 0 && on_segment(a0, a1, b0))
        || (o2 == 0 && on_segment(a0, a1, b1))
        || (o3 == 0 && on_segment(b0, b1, a0))
        || (o4 == 0 && on_segment(b0, b1, a1))
}

/// Returns true if the ring is simple and encloses a positive counter-clockwise area.
pub fn is_valid_ring(ring: &[Point2d]) -> bool {
    ring.len() >= 3 && signed_area(ring) > VERTEX_EPSILON && is_simple(ring)
}

/// The convex hull of a point set, counter-clockwise (monotone chain).
pub fn convex_hull(points: &[Point2d]) -> Vec<Point2d> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|b, a| a.distance(*b) <= VERTEX_EPSILON);
    if pts.len() < 3 {
        return pts;
    }

    let mut lower = half_hull(pts.iter().copied());
    let upper = half_hull(pts.iter().rev().copied());
    lower.extend(upper);
    lower
}

fn half_hull(points: impl Iterator<Item = Point2d>) -> Vec<Point2d> {
    let cross = |o: Point2d, a: Point2d, b: Point2d| (a - o).perp_dot(b - o);
    let mut chain: Vec<Point2d> = vec![];
    for p in points {
        while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0 {
            chain.pop();
        }
        chain.push(p);
    }
    chain.pop();
    chain
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn square(x: f64, z: f64, size: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x, z),
            Point2d::new(x + size, z),
            Point2d::new(x + size, z + size),
            Point2d::new(x, z + size),
        ]
    }

    #[test]
    fn area_sign_follows_winding() {
        let mut sq = square(0.0, 0.0, 2.0);
        assert_approx_eq!(signed_area(&sq), 4.0);
        sq.reverse();
        assert_approx_eq!(signed_area(&sq), -4.0);
        ensure_ccw(&mut sq);
        assert_approx_eq!(signed_area(&sq), 4.0);
    }

    #[test]
    fn clipping_offset_squares() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.5, 0.0, 1.0);
        let overlap = clip_convex(&a, &b);
        assert_approx_eq!(signed_area(&overlap), 0.5);
        let c = centroid(&overlap).unwrap();
        assert_approx_eq!(c.x, 0.75);
        assert_approx_eq!(c.y, 0.5);
    }

    #[test]
    fn clipping_touching_squares_has_no_area() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        assert!(signed_area(&clip_convex(&a, &b)).abs() <= 1e-6);
    }

    #[test]
    fn separating_axis() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(3.0, 0.0, 1.0);
        let axes = [Vector2d::new(1.0, 0.0), Vector2d::new(0.0, 1.0)];
        assert!(!convex_overlap_on_axes(&a, &b, &axes));
        assert!(convex_overlap_on_axes(&a, &square(0.5, 0.5, 1.0), &axes));
    }

    #[test]
    fn bowtie_is_not_simple() {
        let bowtie = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(0.0, 1.0),
        ];
        assert!(!is_simple(&bowtie));
        assert!(is_valid_ring(&square(0.0, 0.0, 1.0)));
    }

    #[test]
    fn hull_drops_interior_points() {
        let mut pts = square(0.0, 0.0, 2.0);
        pts.push(Point2d::new(1.0, 1.0));
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert_approx_eq!(signed_area(&hull), 4.0);
    }
}
