//! Trimming of overlapping and cornering segments.
//!
//! Every pair of segments whose asphalt strips intersect has the intersection removed
//! from both, and every corner that will become a junction has a cut taken from both
//! of its segments. What remains of each segment is split into rectangular pieces.

use crate::road::{Corner, Segment};
use crate::settings::Settings;
use crate::util::Interval;
use crate::{SegmentKey, SegmentSet};
use itertools::Itertools;
use slotmap::SecondaryMap;
use std::collections::BTreeMap;

pub use overlap::{find_overlap, strip, TrimOverlap};
pub use pieces::{Piece, RemovedInterval, SegmentTrim, SourceIds};

mod overlap;
mod pieces;

/// Computes the distance cut from each side of a corner, or `None` if the corner is
/// not cut at all.
pub fn corner_cut_distance(
    corner: &Corner,
    incoming: &Segment,
    outgoing: &Segment,
    settings: &Settings,
) -> Option<f64> {
    let junctions = &settings.junctions;
    let radius =
        incoming.max_half_width().max(outgoing.max_half_width()) * junctions.fillet_radius_factor;
    let snap = settings.snap_step();
    let dist = (radius * (0.5 * corner.turn).tan() * junctions.threshold_factor)
        .min(junctions.max_threshold)
        .min(incoming.length - snap)
        .min(outgoing.length - snap)
        .max(0.0);
    if dist.is_finite() && dist > 1e-9 {
        Some(dist)
    } else {
        None
    }
}

/// Returns true if a corner takes part in a junction and so has to be cut.
pub fn is_corner_cut(corner: &Corner, settings: &Settings) -> bool {
    let junctions = &settings.junctions;
    if !junctions.enabled {
        return false;
    }
    let manual = junctions
        .manual_junctions
        .iter()
        .any(|j| j.candidate_ids.contains(&corner.id));
    manual
        || (junctions.auto_create
            && !junctions.suppressed_auto_junction_ids.contains(&corner.id))
}

/// Trims every segment, filling in each one's [SegmentTrim], and returns the overlaps
/// found in segment ID order.
///
/// `order` lists the segment keys sorted by segment ID.
pub fn trim_segments(
    segments: &mut SegmentSet,
    order: &[SegmentKey],
    corners: &[Corner],
    settings: &Settings,
) -> Vec<TrimOverlap> {
    if !settings.trim.enabled {
        for key in order {
            let segment = &mut segments[*key];
            segment.trim = SegmentTrim::untouched(segment);
        }
        return vec![];
    }

    let mut pending: SecondaryMap<SegmentKey, Vec<RemovedInterval>> =
        order.iter().map(|key| (*key, vec![])).collect();

    let mut overlaps = vec![];
    for (&ka, &kb) in order.iter().tuple_combinations() {
        let (a, b) = (&segments[ka], &segments[kb]);
        if let Some(overlap) = find_overlap(a, b, settings.trim.threshold) {
            pending[ka].push(RemovedInterval::new(overlap.a_span, overlap.id.clone()));
            pending[kb].push(RemovedInterval::new(overlap.b_span, overlap.id.clone()));
            overlaps.push(overlap);
        }
    }

    let by_id: BTreeMap<&str, SegmentKey> = order
        .iter()
        .map(|key| (segments[*key].id.as_str(), *key))
        .collect();
    for corner in corners.iter().filter(|c| is_corner_cut(c, settings)) {
        let (Some(&ki), Some(&ko)) = (
            by_id.get(corner.incoming.as_str()),
            by_id.get(corner.outgoing.as_str()),
        ) else {
            continue;
        };
        let (incoming, outgoing) = (&segments[ki], &segments[ko]);
        if let Some(dist) = corner_cut_distance(corner, incoming, outgoing, settings) {
            log::trace!("cutting {:.3} from each side of {}", dist, corner.id);
            let cut_in = Interval::new(1.0 - dist / incoming.length, 1.0);
            let cut_out = Interval::new(0.0, dist / outgoing.length);
            pending[ki].push(RemovedInterval::new(cut_in, corner.id.clone()));
            pending[ko].push(RemovedInterval::new(cut_out, corner.id.clone()));
        }
    }

    let snap = settings.snap_step();
    for key in order {
        let cuts = pending.remove(*key).unwrap_or_default();
        let segment = &mut segments[*key];
        segment.trim = SegmentTrim::partition(segment, cuts, snap);
    }

    log::debug!("found {} overlaps among {} segments", overlaps.len(), order.len());
    overlaps
}
