use super::Segment;
use crate::math::{signed_turn, Point2d};
use serde::Serialize;

/// Turns sharper than this make an interior point a corner, in radians (1°).
const MIN_CORNER_TURN: f64 = 0.017_453_292_519_943_295;

/// An interior road point where the road changes direction.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Corner {
    /// The corner ID, `cn_<roadId>__<pointId>`.
    pub id: String,
    pub road_id: String,
    pub point_id: String,
    #[serde(with = "crate::util::xz")]
    pub position: Point2d,
    /// Unsigned turn angle in radians.
    pub turn: f64,
    /// Signed turn angle in radians, positive for left (counter-clockwise) turns.
    pub signed_turn: f64,
    /// The segment arriving at the corner.
    pub incoming: String,
    /// The segment leaving the corner.
    pub outgoing: String,
}

/// Finds the corners between consecutive segments of one road.
pub fn find_corners(segments: &[Segment]) -> Vec<Corner> {
    segments
        .windows(2)
        .filter_map(|pair| {
            let (incoming, outgoing) = (&pair[0], &pair[1]);
            let turn = signed_turn(incoming.dir, outgoing.dir);
            if turn.abs() <= MIN_CORNER_TURN {
                return None;
            }
            log::trace!("corner at {} turns {:.3} rad", outgoing.start_point, turn);
            Some(Corner {
                id: format!("cn_{}__{}", outgoing.road_id, outgoing.start_point),
                road_id: outgoing.road_id.clone(),
                point_id: outgoing.start_point.clone(),
                position: outgoing.start,
                turn: turn.abs(),
                signed_turn: turn,
                incoming: incoming.id.clone(),
                outgoing: outgoing.id.clone(),
            })
        })
        .collect()
}
