use crate::math::{Point2d, Vector2d};
use crate::road::Segment;
use crate::trim::{Piece, RemovedInterval, SourceIds};
use crate::util::stable_hash;
use serde::Serialize;
use std::cmp::Ordering;

/// Piece ends this close to 0 or 1 lie on the segment's own end points.
const END_EPSILON: f64 = 1e-6;

/// Piece ends this close to a cut boundary belong to it.
const BOUNDARY_EPSILON: f64 = 1e-5;

/// Which end of a kept piece an endpoint sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PieceEnd {
    /// The end at the smaller parameter, facing backwards along the segment.
    A,
    /// The end at the larger parameter, facing forwards along the segment.
    B,
}

/// A kept piece's end where a junction may attach.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCandidate {
    /// `ep_<segId>__a|b` for a road terminus, `<boundaryKey>__<segId>__a|b` for a cut.
    pub id: String,
    pub road_id: String,
    pub segment_id: String,
    pub piece_id: String,
    pub end: PieceEnd,
    /// Parameter of the end along its segment.
    pub t: f64,
    /// The point on the centerline.
    #[serde(with = "crate::util::xz")]
    pub position: Point2d,
    /// Unit vector pointing out of the piece.
    #[serde(with = "crate::util::xz_vec")]
    pub outward: Vector2d,
    /// The asphalt edge on the left, looking along `outward`.
    #[serde(with = "crate::util::xz")]
    pub left: Point2d,
    /// The asphalt edge on the right, looking along `outward`.
    #[serde(with = "crate::util::xz")]
    pub right: Point2d,
    /// The cut boundary key, `cut_<hash>`; `None` for a road terminus.
    pub boundary: Option<String>,
    /// Every overlap and corner responsible for the cut.
    pub sources: SourceIds,
    /// The overlap sources alone.
    pub overlap_sources: SourceIds,
    /// The corner responsible for the cut, if any.
    pub corner_id: Option<String>,
    pub connect_radius: f64,
}

impl PieceEnd {
    fn tag(self) -> &'static str {
        match self {
            PieceEnd::A => "a",
            PieceEnd::B => "b",
        }
    }
}

/// The key shared by every endpoint created by the same set of cuts.
pub fn boundary_key(sources: &[String]) -> String {
    format!("cut_{}", stable_hash(sources))
}

/// Finds the cut boundary that a piece end sits on: the one whose facing edge is nearest,
/// within [BOUNDARY_EPSILON], with ties going to the smallest joined source list.
fn match_boundary(
    boundaries: &[RemovedInterval],
    t: f64,
    end: PieceEnd,
) -> Option<&RemovedInterval> {
    let edge = |b: &RemovedInterval| match end {
        PieceEnd::A => b.span.max,
        PieceEnd::B => b.span.min,
    };
    boundaries
        .iter()
        .filter(|b| !b.sources.is_empty())
        .map(|b| ((edge(b) - t).abs(), b))
        .filter(|(dist, _)| *dist <= BOUNDARY_EPSILON)
        .min_by(|(da, a), (db, b)| match da.total_cmp(db) {
            Ordering::Equal => a.source_key().cmp(&b.source_key()),
            ord => ord,
        })
        .map(|(_, b)| b)
}

fn candidate(
    segment: &Segment,
    piece: &Piece,
    end: PieceEnd,
    boundaries: &[RemovedInterval],
) -> Option<EndpointCandidate> {
    let t = match end {
        PieceEnd::A => piece.span.min,
        PieceEnd::B => piece.span.max,
    };
    let at_segment_end = match end {
        PieceEnd::A => t <= END_EPSILON,
        PieceEnd::B => t >= 1.0 - END_EPSILON,
    };

    let (id, boundary, sources) = if at_segment_end {
        let terminus = match end {
            PieceEnd::A => segment.starts_road,
            PieceEnd::B => segment.ends_road,
        };
        if !terminus {
            // Road-interior point; the road simply continues
            return None;
        }
        (format!("ep_{}__{}", segment.id, end.tag()), None, SourceIds::new())
    } else {
        let Some(cut) = match_boundary(boundaries, t, end) else {
            log::warn!("{} end of {} has no matching cut", end.tag(), piece.id);
            return None;
        };
        let key = boundary_key(&cut.sources);
        let id = format!("{}__{}__{}", key, segment.id, end.tag());
        (id, Some(key), cut.sources.clone())
    };

    let position = segment.point_at(t);
    let (hl, hr) = (segment.asphalt_half_left, segment.asphalt_half_right);
    let (outward, left, right) = match end {
        PieceEnd::A => (-segment.dir, position + segment.right * hr, position - segment.right * hl),
        PieceEnd::B => (segment.dir, position - segment.right * hl, position + segment.right * hr),
    };

    Some(EndpointCandidate {
        id,
        road_id: segment.road_id.clone(),
        segment_id: segment.id.clone(),
        piece_id: piece.id.clone(),
        end,
        t,
        position,
        outward,
        left,
        right,
        boundary,
        overlap_sources: sources.iter().filter(|s| s.starts_with("ov_")).cloned().collect(),
        corner_id: sources.iter().find(|s| s.starts_with("cn_")).cloned(),
        sources,
        connect_radius: segment.max_half_width(),
    })
}

/// Collects the junction endpoint candidates of a trimmed segment.
pub fn extract_candidates(segment: &Segment) -> Vec<EndpointCandidate> {
    let boundaries = segment.trim.cut_boundaries();
    segment
        .trim
        .kept
        .iter()
        .flat_map(|piece| {
            [PieceEnd::A, PieceEnd::B]
                .into_iter()
                .filter_map(|end| candidate(segment, piece, end, &boundaries))
                .collect::<Vec<_>>()
        })
        .collect()
}
