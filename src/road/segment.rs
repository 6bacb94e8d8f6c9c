use super::Road;
use crate::math::{right_normal, try_normalize, Aabb, Point2d, Vector2d};
use crate::settings::Settings;
use crate::trim::SegmentTrim;
use crate::util::Interval;
use cgmath::prelude::*;
use serde::Serialize;

/// The straight span between two consecutive points of a road.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// The segment ID, `<roadId>:s<index>`.
    pub id: String,
    pub road_id: String,
    /// Index of the start point within the road.
    pub index: usize,
    pub start_point: String,
    pub end_point: String,
    #[serde(with = "crate::util::xz")]
    pub start: Point2d,
    #[serde(with = "crate::util::xz")]
    pub end: Point2d,
    pub length: f64,
    /// Forward unit vector.
    #[serde(with = "crate::util::xz_vec")]
    pub dir: Vector2d,
    /// Right-hand unit normal.
    #[serde(with = "crate::util::xz_vec")]
    pub right: Vector2d,
    pub lanes_f: u32,
    pub lanes_b: u32,
    pub lane_half_left: f64,
    pub lane_half_right: f64,
    pub asphalt_half_left: f64,
    pub asphalt_half_right: f64,
    /// Whether no other segment of the road precedes this one.
    pub starts_road: bool,
    /// Whether no other segment of the road follows this one.
    pub ends_road: bool,
    /// The asphalt rectangle.
    pub obb: Obb,
    pub lines: Vec<OffsetLine>,
    pub trim: SegmentTrim,
}

/// An oriented bounding box whose axis follows a segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Obb {
    #[serde(with = "crate::util::xz")]
    pub center: Point2d,
    #[serde(with = "crate::util::xz_vec")]
    pub axis: Vector2d,
    pub half_length: f64,
    pub half_width_left: f64,
    pub half_width_right: f64,
    /// Counter-clockwise: start-right, end-right, end-left, start-left.
    #[serde(with = "crate::util::xz_seq")]
    pub corners: [Point2d; 4],
    pub aabb: Aabb,
}

/// A straight line running parallel to a segment's centerline.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetLine {
    pub kind: LineKind,
    /// Lateral offset from the centerline; positive to the right.
    pub offset: f64,
    #[serde(with = "crate::util::xz_seq")]
    pub points: [Point2d; 2],
}

/// The role of an [OffsetLine].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Centerline,
    ForwardCenterline,
    BackwardCenterline,
    LaneDivider,
    LaneEdge,
    AsphaltEdge,
}

impl Obb {
    /// Creates a box from a start point, unit axis and length, with separate half-widths
    /// on each side of the axis.
    pub fn new(start: Point2d, axis: Vector2d, length: f64, left: f64, right: f64) -> Self {
        let normal = right_normal(axis);
        let end = start + axis * length;
        let corners = [
            start + normal * right,
            end + normal * right,
            end - normal * left,
            start - normal * left,
        ];
        Self {
            center: start + axis * (0.5 * length),
            axis,
            half_length: 0.5 * length,
            half_width_left: left,
            half_width_right: right,
            corners,
            aabb: Aabb::from_points(&corners),
        }
    }

    /// The right-hand normal of the axis.
    pub fn normal(&self) -> Vector2d {
        right_normal(self.axis)
    }

    /// The start of the box's axis.
    pub fn start(&self) -> Point2d {
        self.center - self.axis * self.half_length
    }

    /// Grows the box by `pad` in every direction.
    pub fn expanded(&self, pad: f64) -> Self {
        Self::new(
            self.start() - self.axis * pad,
            self.axis,
            2.0 * (self.half_length + pad),
            self.half_width_left + pad,
            self.half_width_right + pad,
        )
    }

    /// The sub-box spanning a parameter interval of the axis.
    pub fn cut(&self, span: Interval<f64>) -> Self {
        let along = Interval::new(0.0, 2.0 * self.half_length);
        let (from, to) = (along.lerp(span.min), along.lerp(span.max));
        Self::new(
            self.start() + self.axis * from,
            self.axis,
            to - from,
            self.half_width_left,
            self.half_width_right,
        )
    }
}

impl Segment {
    /// The point at parameter `t` along the centerline.
    pub fn point_at(&self, t: f64) -> Point2d {
        self.start + self.dir * (t * self.length)
    }

    /// The largest asphalt half-width on either side.
    pub fn max_half_width(&self) -> f64 {
        self.asphalt_half_left.max(self.asphalt_half_right)
    }

    /// The parameter of the projection of `point` onto the centerline, unclamped.
    pub fn param_of(&self, point: Point2d) -> f64 {
        (point - self.start).dot(self.dir) / self.length
    }
}

/// Builds a segment for every consecutive pair of points with a usable direction.
/// Zero-length spans are skipped; the pair index still names each segment.
pub fn build_segments(road: &Road, settings: &Settings) -> Vec<Segment> {
    let lane_right = road.lanes_f as f64 * settings.lane_width;
    let lane_left = road.lanes_b as f64 * settings.lane_width;
    let margin = settings.margin();

    let mut segments = road
        .points
        .windows(2)
        .enumerate()
        .filter_map(|(index, pair)| {
            let (a, b) = (&pair[0], &pair[1]);
            let delta = b.world - a.world;
            let dir = try_normalize(delta)?;
            let length = delta.magnitude();
            let right = right_normal(dir);
            let (asphalt_left, asphalt_right) = (lane_left + margin, lane_right + margin);

            let line = |kind, offset: f64| OffsetLine {
                kind,
                offset,
                points: [a.world + right * offset, b.world + right * offset],
            };
            let mut lines = vec![line(LineKind::Centerline, 0.0)];
            if road.lanes_f > 0 {
                lines.push(line(LineKind::ForwardCenterline, 0.5 * lane_right));
            }
            if road.lanes_b > 0 {
                let mut backward = line(LineKind::BackwardCenterline, -0.5 * lane_left);
                backward.points.reverse();
                lines.push(backward);
            }
            let w = settings.lane_width;
            lines.extend((1..road.lanes_f).map(|k| line(LineKind::LaneDivider, k as f64 * w)));
            lines.extend((1..road.lanes_b).map(|k| line(LineKind::LaneDivider, -(k as f64) * w)));
            if road.lanes_f > 0 {
                lines.push(line(LineKind::LaneEdge, lane_right));
            }
            if road.lanes_b > 0 {
                lines.push(line(LineKind::LaneEdge, -lane_left));
            }
            lines.push(line(LineKind::AsphaltEdge, asphalt_right));
            lines.push(line(LineKind::AsphaltEdge, -asphalt_left));

            Some(Segment {
                id: format!("{}:s{}", road.id, index),
                road_id: road.id.clone(),
                index,
                start_point: a.id.clone(),
                end_point: b.id.clone(),
                start: a.world,
                end: b.world,
                length,
                dir,
                right,
                lanes_f: road.lanes_f,
                lanes_b: road.lanes_b,
                lane_half_left: lane_left,
                lane_half_right: lane_right,
                asphalt_half_left: asphalt_left,
                asphalt_half_right: asphalt_right,
                starts_road: false,
                ends_road: false,
                obb: Obb::new(a.world, dir, length, asphalt_left, asphalt_right),
                lines,
                trim: SegmentTrim::default(),
            })
        })
        .collect::<Vec<_>>();

    if let Some(first) = segments.first_mut() {
        first.starts_road = true;
    }
    if let Some(last) = segments.last_mut() {
        last.ends_road = true;
    }
    segments
}
