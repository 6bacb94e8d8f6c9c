use crate::input::{PointInput, RoadInput};
use crate::math::{finite_or, normalize_point, Point2d, TileCoord};
use crate::settings::Settings;
use serde::Serialize;

pub use corner::{find_corners, Corner};
pub use segment::{build_segments, LineKind, Obb, OffsetLine, Segment};

mod corner;
mod segment;

/// A road with its control points normalized onto the tile grid.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Road {
    pub id: String,
    pub name: String,
    pub lanes_f: u32,
    pub lanes_b: u32,
    pub points: Vec<Point>,
    /// IDs of the non-degenerate segments, in point order.
    pub segment_ids: Vec<String>,
}

/// A normalized control point.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    /// Position of the point within the road.
    pub index: usize,
    #[serde(flatten)]
    pub tile: TileCoord,
    /// World XZ position.
    #[serde(with = "crate::util::xz")]
    pub world: Point2d,
    pub tangent_factor: f64,
}

impl Road {
    /// Normalizes every control point of an authored road.
    pub fn new(input: &RoadInput, settings: &Settings) -> Self {
        let points = input
            .points
            .iter()
            .enumerate()
            .map(|(index, p)| Point::new(&input.id, index, p, settings))
            .collect();
        Self {
            id: input.id.clone(),
            name: input.name.clone(),
            lanes_f: input.lanes_f.min(crate::input::MAX_LANES),
            lanes_b: input.lanes_b.min(crate::input::MAX_LANES),
            points,
            segment_ids: vec![],
        }
    }
}

impl Point {
    /// Resolves fractional offsets, canonicalizes them and computes the world position.
    fn new(road_id: &str, index: usize, input: &PointInput, settings: &Settings) -> Self {
        let size = settings.tile_size;
        let offset_u = input
            .offset_u
            .or_else(|| input.offset_x.map(|x| x / size))
            .unwrap_or(0.0);
        let offset_v = input
            .offset_v
            .or_else(|| input.offset_z.map(|z| z / size))
            .unwrap_or(0.0);
        let tile = normalize_point(input.tile_x, input.tile_y, offset_u, offset_v);
        let world = Point2d::new(
            settings.origin.x + (tile.tile_x as f64 + tile.offset_u) * size,
            settings.origin.z + (tile.tile_y as f64 + tile.offset_v) * size,
        );
        let tangent_factor = finite_or(input.tangent_factor, 1.0);
        Self {
            id: input
                .id
                .clone()
                .unwrap_or_else(|| format!("{}:p{}", road_id, index)),
            index,
            tile,
            world,
            tangent_factor,
        }
    }
}
