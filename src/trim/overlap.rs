use crate::math::{
    centroid, clip_convex, convex_overlap_on_axes, line_intersection, signed_area, Point2d,
};
use crate::road::{Obb, Segment};
use crate::util::Interval;
use cgmath::prelude::*;
use serde::Serialize;

/// Overlap polygons with a smaller area are ignored.
const MIN_OVERLAP_AREA: f64 = 1e-6;

/// Removal intervals narrower than this are ignored.
const MIN_SPAN_WIDTH: f64 = 1e-9;

/// Segments whose directions have an absolute cosine at least this large are parallel.
const PARALLEL_COS: f64 = 0.999;

/// Two segments whose asphalt strips intersect.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimOverlap {
    /// The source ID, `ov_<aId>__<bId>`.
    pub id: String,
    pub a: String,
    pub b: String,
    /// The intersection of the two strips, counter-clockwise.
    #[serde(with = "crate::util::xz_seq")]
    pub polygon: Vec<Point2d>,
    pub area: f64,
    /// Where the centerlines cross, or the centroid of the polygon if they don't.
    #[serde(with = "crate::util::xz")]
    pub anchor: Point2d,
    /// The span of segment `a` removed by this overlap.
    pub a_span: Interval<f64>,
    /// The span of segment `b` removed by this overlap.
    pub b_span: Interval<f64>,
}

/// The strip of a segment used for overlap tests: its asphalt box grown by half the
/// trim threshold.
pub fn strip(segment: &Segment, threshold: f64) -> Obb {
    segment.obb.expanded(0.5 * threshold)
}

fn shares_endpoint(a: &Segment, b: &Segment) -> bool {
    let ids = [&a.start_point, &a.end_point];
    if ids.contains(&&b.start_point) || ids.contains(&&b.end_point) {
        return true;
    }
    [a.start, a.end]
        .iter()
        .any(|p| p.distance(b.start) <= 1e-6 || p.distance(b.end) <= 1e-6)
}

/// Returns true if a pair of segments should never trim each other: neighbours on the same
/// road, or a road continuing straight into another.
fn is_continuation(a: &Segment, b: &Segment) -> bool {
    if !shares_endpoint(a, b) {
        return false;
    }
    a.road_id == b.road_id || a.dir.dot(b.dir).abs() >= PARALLEL_COS
}

/// Computes the overlap between two segments' strips, if there is a meaningful one.
pub fn find_overlap(a: &Segment, b: &Segment, threshold: f64) -> Option<TrimOverlap> {
    if is_continuation(a, b) {
        return None;
    }

    // Broad phase
    let (strip_a, strip_b) = (strip(a, threshold), strip(b, threshold));
    if !strip_a.aabb.intersects(&strip_b.aabb) {
        return None;
    }
    let axes = [strip_a.axis, strip_a.normal(), strip_b.axis, strip_b.normal()];
    if !convex_overlap_on_axes(&strip_a.corners, &strip_b.corners, &axes) {
        return None;
    }

    // Narrow phase
    let polygon = clip_convex(&clip_convex(&strip_a.corners, &strip_b.corners), &strip_a.corners);
    let area = signed_area(&polygon).abs();
    if polygon.len() < 3 || area <= MIN_OVERLAP_AREA {
        return None;
    }

    let anchor = line_intersection(a.start, a.dir, b.start, b.dir)
        .filter(|hit| (0.0..=a.length).contains(&hit.t) && (0.0..=b.length).contains(&hit.u))
        .map(|hit| hit.point)
        .or_else(|| centroid(&polygon))?;

    let unit = Interval::new(0.0, 1.0);
    let span_on = |seg: &Segment| {
        polygon
            .iter()
            .map(|p| seg.param_of(*p))
            .fold(Interval::new(f64::INFINITY, f64::NEG_INFINITY), |i, t| i.include(t))
            .clamp_to(unit)
    };
    let (a_span, b_span) = (span_on(a), span_on(b));
    if a_span.length() <= MIN_SPAN_WIDTH || b_span.length() <= MIN_SPAN_WIDTH {
        return None;
    }

    log::trace!("{} overlaps {} (area {:.3})", a.id, b.id, area);
    Some(TrimOverlap {
        id: format!("ov_{}__{}", a.id, b.id),
        a: a.id.clone(),
        b: b.id.clone(),
        polygon,
        area,
        anchor,
        a_span,
        b_span,
    })
}
