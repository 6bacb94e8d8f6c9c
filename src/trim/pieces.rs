use crate::road::{Obb, Segment};
use crate::util::Interval;
use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

/// Removal intervals closer than this are merged.
pub(crate) const MERGE_GAP: f64 = 1e-6;

/// The IDs of the overlaps and corners responsible for a cut.
pub type SourceIds = SmallVec<[String; 2]>;

/// A span of a segment's `[0, 1]` domain removed by one or more cuts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RemovedInterval {
    pub span: Interval<f64>,
    /// Sorted, without duplicates.
    pub sources: SourceIds,
}

/// A rectangular piece of a segment's asphalt.
#[derive(Clone, Debug, Serialize)]
pub struct Piece {
    pub id: String,
    pub span: Interval<f64>,
    pub obb: Obb,
}

/// The partition of a segment's domain into removed, kept and dropped spans.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SegmentTrim {
    /// Whether any cut touched the segment.
    pub trimmed: bool,
    pub removed: Vec<RemovedInterval>,
    pub kept: Vec<Piece>,
    pub dropped: Vec<Piece>,
}

impl RemovedInterval {
    pub fn new(span: Interval<f64>, source: impl Into<String>) -> Self {
        Self {
            span,
            sources: SmallVec::from_elem(source.into(), 1),
        }
    }

    /// The source IDs joined into one string, used for ordering and hashing.
    pub fn source_key(&self) -> String {
        self.sources.iter().join("|")
    }

    fn absorb(&mut self, other: &RemovedInterval) {
        self.span = Interval::new(
            self.span.min.min(other.span.min),
            self.span.max.max(other.span.max),
        );
        self.sources.extend(other.sources.iter().cloned());
        self.sources.sort();
        self.sources.dedup();
    }
}

/// Sorts intervals by start and merges any that overlap or are separated by at most
/// [MERGE_GAP], uniting their sources.
pub fn merge_intervals(mut intervals: Vec<RemovedInterval>) -> Vec<RemovedInterval> {
    intervals.sort_by(|a, b| {
        a.span
            .min
            .total_cmp(&b.span.min)
            .then(a.span.max.total_cmp(&b.span.max))
            .then_with(|| a.sources.cmp(&b.sources))
    });
    let mut merged: Vec<RemovedInterval> = Vec::with_capacity(intervals.len());
    for mut interval in intervals {
        interval.sources.sort();
        interval.sources.dedup();
        match merged.last_mut() {
            Some(last) if interval.span.min <= last.span.max + MERGE_GAP => last.absorb(&interval),
            _ => merged.push(interval),
        }
    }
    merged
}

impl SegmentTrim {
    /// A segment without any cuts: a single kept piece covering the whole asphalt box.
    pub fn untouched(segment: &Segment) -> Self {
        Self {
            trimmed: false,
            removed: vec![],
            kept: vec![Piece {
                id: format!("{}#k0", segment.id),
                span: Interval::new(0.0, 1.0),
                obb: segment.obb,
            }],
            dropped: vec![],
        }
    }

    /// Partitions a segment's domain given its pending removal intervals.
    ///
    /// Remainders shorter than `snap_step` (in world length) are dropped, but only on
    /// segments that were cut at all.
    pub fn partition(segment: &Segment, pending: Vec<RemovedInterval>, snap_step: f64) -> Self {
        let unit = Interval::new(0.0, 1.0);
        let pending = pending
            .into_iter()
            .map(|r| RemovedInterval {
                span: r.span.clamp_to(unit),
                ..r
            })
            .filter(|r| r.span.length() > 0.0)
            .collect::<Vec<_>>();
        if pending.is_empty() {
            return Self::untouched(segment);
        }

        let removed = merge_intervals(pending);
        let mut spans = vec![];
        let mut cursor = 0.0;
        for r in &removed {
            if r.span.min > cursor + MERGE_GAP {
                spans.push(Interval::new(cursor, r.span.min));
            }
            cursor = f64::max(cursor, r.span.max);
        }
        if cursor < 1.0 - MERGE_GAP {
            spans.push(Interval::new(cursor, 1.0));
        }

        let (kept, dropped): (Vec<_>, Vec<_>) = spans
            .into_iter()
            .partition(|span| span.length() * segment.length >= snap_step);
        let pieces = |spans: Vec<Interval<f64>>, tag: &str| {
            spans
                .into_iter()
                .enumerate()
                .map(|(i, span)| Piece {
                    id: format!("{}#{}{}", segment.id, tag, i),
                    span,
                    obb: segment.obb.cut(span),
                })
                .collect::<Vec<_>>()
        };

        Self {
            trimmed: true,
            kept: pieces(kept, "k"),
            dropped: pieces(dropped, "d"),
            removed,
        }
    }

    /// The cut boundaries between kept pieces: removed intervals with any neighbouring
    /// dropped pieces folded in.
    pub fn cut_boundaries(&self) -> Vec<RemovedInterval> {
        let dropped = self.dropped.iter().map(|p| RemovedInterval {
            span: p.span,
            sources: SmallVec::new(),
        });
        merge_intervals(self.removed.iter().cloned().chain(dropped).collect())
    }
}
