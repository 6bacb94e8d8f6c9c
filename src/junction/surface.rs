//! Drivable surfaces of junctions.
//!
//! A surface is bounded by the mouths of its endpoints (from the left asphalt edge to the
//! right one) and by the joins between neighbouring mouths. Each join runs from one
//! endpoint's right edge to the next endpoint's left edge: a straight run into a fillet
//! arc followed by a straight run out (tangent-arc-tangent).

use super::candidate::EndpointCandidate;
use crate::math::{
    arc_segments, convex_hull, dedupe_ring, edge_fillet_arc, ensure_ccw, is_valid_ring,
    line_intersection, right_normal, rot90, sample_arc, turn_angle, FilletArc, FilletRequest,
    Point2d, Vector2d,
};
use crate::util::rotated_range;
use cgmath::prelude::*;
use serde::Serialize;

/// Fillet scales tried in turn; the last one gives sharp joins.
const SCALE_SCHEDULE: [f64; 7] = [1.0, 0.75, 0.55, 0.4, 0.28, 0.18, 0.0];

/// Slack allowed when checking tangent points against the miter point.
const MITER_TOLERANCE: f64 = 1e-6;

/// How a junction surface was built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceMethod {
    /// An inner and an outer edge between two endpoints.
    Tat,
    /// Filleted joins around the cycle of endpoints.
    Walk,
    /// The mouths alone, joined by straight lines.
    Naive,
    /// The convex hull of the mouths.
    Hull,
}

/// The role of a [TatEdge].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeLabel {
    Outer,
    Inner,
    Join,
}

/// One boundary edge of a junction surface between two endpoint mouths.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TatEdge {
    pub id: String,
    pub label: EdgeLabel,
    /// The endpoint the edge leaves from.
    pub from: String,
    /// The endpoint the edge arrives at.
    pub to: String,
    #[serde(with = "crate::util::xz_seq")]
    pub points: Vec<Point2d>,
    /// The fillet, unless the join is sharp.
    pub arc: Option<FilletArc>,
}

/// The drivable polygon of a junction.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionSurface {
    pub method: SurfaceMethod,
    /// The fillet scale that produced a valid polygon.
    pub scale: f64,
    /// Closed, simple and counter-clockwise.
    #[serde(with = "crate::util::xz_seq")]
    pub polygon: Vec<Point2d>,
    pub edges: Vec<TatEdge>,
}

/// A join between two rays, before it is given an identity.
struct Join {
    points: Vec<Point2d>,
    arc: Option<FilletArc>,
}

impl TatEdge {
    /// Length of the edge polyline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Joins the ray from `p0` along `dir0` to the ray from `p1` along `dir1`, travelling out
/// along the first and back in along the second.
///
/// The fillet radius is the miter distance × tan(turn / 2) × `scale`. Among the two
/// side-consistent placements of the fillet centre, only those whose tangent points lie
/// between the ray origins and the miter point are kept; of those the one whose arc
/// midpoint lies closest to the miter point wins. Without a usable fillet the join is
/// sharp.
fn join(p0: Point2d, dir0: Vector2d, p1: Point2d, dir1: Vector2d, scale: f64) -> Join {
    let hit = line_intersection(p0, dir0, p1, dir1).filter(|hit| hit.t > 1e-9 && hit.u > 1e-9);
    let Some(hit) = hit else {
        return Join {
            points: vec![p0, p1],
            arc: None,
        };
    };
    let sharp = Join {
        points: vec![p0, hit.point, p1],
        arc: None,
    };
    if scale <= 0.0 {
        return sharp;
    }

    let turn = turn_angle(dir0, -dir1);
    let radius = hit.t.min(hit.u) * (0.5 * turn).tan() * scale;
    let arc = [
        (rot90(dir0), right_normal(dir1)),
        (right_normal(dir0), rot90(dir1)),
    ]
    .iter()
    .filter_map(|&(out0, out1)| {
        edge_fillet_arc(&FilletRequest {
            p0,
            dir0,
            out0,
            p1,
            dir1,
            out1,
            radius,
        })
    })
    .filter(|arc| {
        (arc.tangent0 - p0).dot(dir0) <= hit.t + MITER_TOLERANCE
            && (arc.tangent1 - p1).dot(dir1) <= hit.u + MITER_TOLERANCE
    })
    .min_by(|a, b| {
        a.midpoint()
            .distance2(hit.point)
            .total_cmp(&b.midpoint().distance2(hit.point))
    });

    match arc {
        Some(arc) => {
            let mut points = vec![p0];
            points.extend(sample_arc(&arc, arc_segments(arc.span_ang)));
            points.push(p1);
            points.dedup_by(|b, a| a.distance(*b) <= 1e-9);
            Join {
                points,
                arc: Some(arc),
            }
        }
        None => sharp,
    }
}

/// Normalizes a ring to counter-clockwise order, returning it if it is a valid polygon.
fn finish(ring: Vec<Point2d>) -> Option<Vec<Point2d>> {
    let mut ring = dedupe_ring(ring);
    ensure_ccw(&mut ring);
    if is_valid_ring(&ring) {
        Some(ring)
    } else {
        None
    }
}

fn edge(
    junction_id: &str,
    index: usize,
    label: EdgeLabel,
    from: &EndpointCandidate,
    to: &EndpointCandidate,
    join: Join,
) -> TatEdge {
    TatEdge {
        id: format!("{}:tat{}", junction_id, index),
        label,
        from: from.id.clone(),
        to: to.id.clone(),
        points: join.points,
        arc: join.arc,
    }
}

/// Builds the surface between exactly two endpoints: two edges, pairing the asphalt edges
/// whichever way keeps them closest, stitched outer-forward then inner-reversed.
fn tat_surface(
    junction_id: &str,
    e0: &EndpointCandidate,
    e1: &EndpointCandidate,
) -> Option<JunctionSurface> {
    let crossed = e0.left.distance(e1.right) + e0.right.distance(e1.left);
    let parallel = e0.left.distance(e1.left) + e0.right.distance(e1.right);
    let ((a0, a1), (b0, b1)) = if crossed <= parallel {
        ((e0.right, e1.left), (e0.left, e1.right))
    } else {
        ((e0.right, e1.right), (e0.left, e1.left))
    };

    for scale in SCALE_SCHEDULE {
        let first = join(a0, e0.outward, a1, e1.outward, scale);
        let first = edge(junction_id, 0, EdgeLabel::Join, e0, e1, first);
        let second = join(b0, e0.outward, b1, e1.outward, scale);
        let second = edge(junction_id, 1, EdgeLabel::Join, e0, e1, second);
        let (mut outer, mut inner) = if first.length() >= second.length() {
            (first, second)
        } else {
            (second, first)
        };
        outer.label = EdgeLabel::Outer;
        inner.label = EdgeLabel::Inner;

        let ring = outer
            .points
            .iter()
            .chain(inner.points.iter().rev())
            .copied()
            .collect();
        if let Some(polygon) = finish(ring) {
            return Some(JunctionSurface {
                method: SurfaceMethod::Tat,
                scale,
                polygon,
                edges: vec![outer, inner],
            });
        }
    }
    None
}

/// Walks the endpoints in cyclic order, crossing each mouth and joining it to the next.
fn walk_surface(junction_id: &str, ordered: &[&EndpointCandidate]) -> Option<JunctionSurface> {
    let n = ordered.len();
    for scale in SCALE_SCHEDULE {
        let mut ring = vec![];
        let mut edges = vec![];
        for (i, next) in rotated_range(n, 1).enumerate() {
            let (from, to) = (ordered[i], ordered[next]);
            ring.push(from.left);
            let run = join(from.right, from.outward, to.left, to.outward, scale);
            // The join's last point is the next mouth's left edge
            ring.extend(run.points.iter().take(run.points.len().saturating_sub(1)).copied());
            edges.push(edge(junction_id, i, EdgeLabel::Join, from, to, run));
        }
        if let Some(polygon) = finish(ring) {
            return Some(JunctionSurface {
                method: SurfaceMethod::Walk,
                scale,
                polygon,
                edges,
            });
        }
    }
    None
}

/// Builds the surface of a junction whose endpoints are in counter-clockwise order,
/// falling back to simpler shapes until one is a valid polygon.
pub fn build_surface(junction_id: &str, ordered: &[&EndpointCandidate]) -> Option<JunctionSurface> {
    if ordered.len() < 2 {
        return None;
    }
    if let [e0, e1] = ordered {
        if let Some(surface) = tat_surface(junction_id, e0, e1) {
            return Some(surface);
        }
    }
    if let Some(surface) = walk_surface(junction_id, ordered) {
        return Some(surface);
    }

    log::debug!("junction {} falls back to its mouths", junction_id);
    let mouths = ordered.iter().flat_map(|e| [e.left, e.right]).collect::<Vec<_>>();
    if let Some(polygon) = finish(mouths.clone()) {
        return Some(JunctionSurface {
            method: SurfaceMethod::Naive,
            scale: 0.0,
            polygon,
            edges: vec![],
        });
    }
    let surface = finish(convex_hull(&mouths)).map(|polygon| JunctionSurface {
        method: SurfaceMethod::Hull,
        scale: 0.0,
        polygon,
        edges: vec![],
    });
    if surface.is_none() {
        log::debug!("junction {} has no valid surface", junction_id);
    }
    surface
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::signed_area;
    use crate::trim::SourceIds;
    use crate::junction::candidate::PieceEnd;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    fn endpoint(id: &str, position: Point2d, outward: Vector2d, half: f64) -> EndpointCandidate {
        let right = right_normal(outward);
        EndpointCandidate {
            id: id.into(),
            road_id: "r".into(),
            segment_id: "r:s0".into(),
            piece_id: format!("{}#k0", id),
            end: PieceEnd::B,
            t: 1.0,
            position,
            outward,
            left: position - right * half,
            right: position + right * half,
            boundary: None,
            sources: SourceIds::new(),
            overlap_sources: SourceIds::new(),
            corner_id: None,
            connect_radius: half,
        }
    }

    #[test]
    fn right_angle_tat() {
        let e0 = endpoint("e0", Point2d::new(76.08, 12.0), Vector2d::new(1.0, 0.0), 5.28);
        let e1 = endpoint("e1", Point2d::new(84.0, 19.92), Vector2d::new(0.0, -1.0), 5.28);
        let surface = build_surface("j", &[&e0, &e1]).unwrap();
        assert_eq!(surface.method, SurfaceMethod::Tat);
        assert_eq!(surface.scale, 1.0);

        let outer = &surface.edges[0];
        let inner = &surface.edges[1];
        assert_eq!(outer.label, EdgeLabel::Outer);
        assert_eq!(inner.label, EdgeLabel::Inner);
        let (oa, ia) = (outer.arc.unwrap(), inner.arc.unwrap());
        assert_approx_eq!(oa.radius, 13.2, 1e-9);
        assert_approx_eq!(ia.radius, 2.64, 1e-9);
        assert_approx_eq!(oa.center.x, 76.08, 1e-9);
        assert_approx_eq!(oa.center.y, 19.92, 1e-9);

        // Quarter annulus
        let area = 0.25 * PI * (13.2 * 13.2 - 2.64 * 2.64);
        assert_approx_eq!(signed_area(&surface.polygon), area, 1.0);
        assert!(signed_area(&surface.polygon) > 0.0);
    }

    #[test]
    fn four_way_square() {
        let h = 5.28;
        let ends = [
            endpoint("e", Point2d::new(h, 0.0), Vector2d::new(-1.0, 0.0), h),
            endpoint("n", Point2d::new(0.0, h), Vector2d::new(0.0, -1.0), h),
            endpoint("w", Point2d::new(-h, 0.0), Vector2d::new(1.0, 0.0), h),
            endpoint("s", Point2d::new(0.0, -h), Vector2d::new(0.0, 1.0), h),
        ];
        let ordered = ends.iter().collect::<Vec<_>>();
        let surface = build_surface("j", &ordered).unwrap();
        assert_eq!(surface.method, SurfaceMethod::Walk);
        assert_eq!(surface.polygon.len(), 4);
        assert_approx_eq!(signed_area(&surface.polygon), 4.0 * h * h, 1e-6);
    }

    fn unit_ends(spec: &[((f64, f64), (f64, f64))]) -> Vec<EndpointCandidate> {
        spec.iter()
            .enumerate()
            .map(|(i, &((x, y), (dx, dz)))| {
                endpoint(&format!("e{}", i), Point2d::new(x, y), Vector2d::new(dx, dz), 1.0)
            })
            .collect()
    }

    #[test]
    fn walk_shrinks_fillets_until_valid() {
        let ends = unit_ends(&[
            ((4.0, 3.0), (-1.0, 0.0)),
            ((0.0, -1.0), (0.0, 1.0)),
            ((2.0, 3.0), (0.0, 1.0)),
        ]);
        let ordered = ends.iter().collect::<Vec<_>>();
        let surface = build_surface("j", &ordered).unwrap();
        assert_eq!(surface.method, SurfaceMethod::Walk);
        assert_eq!(surface.scale, 0.75);
        assert_eq!(surface.edges.len(), 3);
        assert!(is_valid_ring(&surface.polygon));
    }

    #[test]
    fn falls_back_to_mouths() {
        let ends = unit_ends(&[
            ((1.0, 1.0), (-1.0, 0.0)),
            ((0.0, 0.0), (-1.0, 0.0)),
            ((-2.0, -3.0), (0.0, 1.0)),
        ]);
        let ordered = ends.iter().collect::<Vec<_>>();
        let surface = build_surface("j", &ordered).unwrap();
        assert_eq!(surface.method, SurfaceMethod::Naive);
        assert_eq!(surface.scale, 0.0);
        assert!(surface.edges.is_empty());
        assert_eq!(surface.polygon.len(), 6);
        assert!(is_valid_ring(&surface.polygon));
        assert_approx_eq!(signed_area(&surface.polygon), 6.5, 1e-9);
    }

    #[test]
    fn falls_back_to_hull() {
        let ends = unit_ends(&[
            ((0.0, 4.0), (0.0, 1.0)),
            ((-1.0, 3.0), (0.0, -1.0)),
            ((2.0, -2.0), (0.0, 1.0)),
        ]);
        let ordered = ends.iter().collect::<Vec<_>>();
        let surface = build_surface("j", &ordered).unwrap();
        assert_eq!(surface.method, SurfaceMethod::Hull);
        assert_eq!(surface.scale, 0.0);
        assert_eq!(surface.polygon.len(), 5);
        assert!(is_valid_ring(&surface.polygon));
        assert_approx_eq!(signed_area(&surface.polygon), 16.0, 1e-9);
    }

    #[test]
    fn hairpin_is_valid_or_omitted() {
        for degrees in [170.0_f64, 175.0, 178.0, 179.0, 179.9] {
            let back = PI - degrees.to_radians();
            let e0 = endpoint("e0", Point2d::new(0.0, 0.0), Vector2d::new(1.0, 0.0), 1.0);
            let outward = Vector2d::new(back.cos(), back.sin());
            let e1 = endpoint("e1", Point2d::new(0.0, -3.0), outward, 1.0);
            if let Some(surface) = build_surface("j", &[&e0, &e1]) {
                assert!(is_valid_ring(&surface.polygon), "{}", degrees);
            }
        }
    }

    #[test]
    fn parallel_rays_join_sharply() {
        let j = join(
            Point2d::new(0.0, 0.0),
            Vector2d::new(1.0, 0.0),
            Point2d::new(0.0, 1.0),
            Vector2d::new(1.0, 0.0),
            1.0,
        );
        assert!(j.arc.is_none());
        assert_eq!(j.points.len(), 2);
    }
}
