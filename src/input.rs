//! Lenient readers for the authored road network.
//!
//! Nothing here fails: missing or malformed fields fall back to defaults, so the
//! compiler always receives a structurally valid input.

use serde_json::Value;
use std::cmp::Ordering;

/// The default number of lanes in each direction.
const DEFAULT_LANES: u32 = 1;

/// The maximum number of lanes in each direction.
pub const MAX_LANES: u32 = 99;

/// An authored road.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadInput {
    /// Unique road ID.
    pub id: String,
    /// The display name; defaults to the ID.
    pub name: String,
    /// Number of lanes running along the point order, clamped to `0..=99`.
    pub lanes_f: u32,
    /// Number of lanes running against the point order, clamped to `0..=99`.
    pub lanes_b: u32,
    /// The centerline control points.
    pub points: Vec<PointInput>,
}

/// An authored control point, in tile coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointInput {
    pub id: Option<String>,
    pub tile_x: i64,
    pub tile_y: i64,
    /// Fractional tile offsets, if given explicitly.
    pub offset_u: Option<f64>,
    pub offset_v: Option<f64>,
    /// Legacy world-unit offsets, divided by the tile size when no fractional offset is given.
    pub offset_x: Option<f64>,
    pub offset_z: Option<f64>,
    pub tangent_factor: f64,
}

impl RoadInput {
    /// Creates a road with the default lane counts.
    pub fn new(id: impl Into<String>, points: Vec<PointInput>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            lanes_f: DEFAULT_LANES,
            lanes_b: DEFAULT_LANES,
            points,
        }
    }

    /// Sets the lane counts, clamped to the supported range.
    pub fn with_lanes(mut self, lanes_f: u32, lanes_b: u32) -> Self {
        self.lanes_f = lanes_f.min(MAX_LANES);
        self.lanes_b = lanes_b.min(MAX_LANES);
        self
    }

    /// A total order on the road's content, ID first. Roads that compare equal are
    /// indistinguishable.
    pub fn content_cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.lanes_f.cmp(&other.lanes_f))
            .then_with(|| self.lanes_b.cmp(&other.lanes_b))
            .then_with(|| {
                self.points
                    .iter()
                    .zip(&other.points)
                    .map(|(a, b)| a.content_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| self.points.len().cmp(&other.points.len()))
            })
    }

    /// Reads a road from a JSON object. Returns `None` if the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = read_string(value, "id").unwrap_or_default();
        let name = read_string(value, "name").unwrap_or_else(|| id.clone());
        let points = obj
            .get("points")
            .and_then(Value::as_array)
            .map(|pts| pts.iter().filter_map(PointInput::from_value).collect())
            .unwrap_or_default();
        Some(Self {
            id,
            name,
            lanes_f: read_lanes(value, "lanesF"),
            lanes_b: read_lanes(value, "lanesB"),
            points,
        })
    }
}

impl PointInput {
    /// Creates a point at the given tile and fractional offset.
    pub fn tile(tile_x: i64, tile_y: i64, offset_u: f64, offset_v: f64) -> Self {
        Self {
            id: None,
            tile_x,
            tile_y,
            offset_u: Some(offset_u),
            offset_v: Some(offset_v),
            offset_x: None,
            offset_z: None,
            tangent_factor: 1.0,
        }
    }

    /// Sets the point ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// A total order on the point's content.
    pub fn content_cmp(&self, other: &Self) -> Ordering {
        fn opt(a: Option<f64>, b: Option<f64>) -> Ordering {
            match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => a.is_some().cmp(&b.is_some()),
            }
        }
        self.id
            .cmp(&other.id)
            .then_with(|| self.tile_x.cmp(&other.tile_x))
            .then_with(|| self.tile_y.cmp(&other.tile_y))
            .then_with(|| opt(self.offset_u, other.offset_u))
            .then_with(|| opt(self.offset_v, other.offset_v))
            .then_with(|| opt(self.offset_x, other.offset_x))
            .then_with(|| opt(self.offset_z, other.offset_z))
            .then_with(|| self.tangent_factor.total_cmp(&other.tangent_factor))
    }

    /// Reads a point from a JSON object. Returns `None` if the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        Some(Self {
            id: read_string(value, "id"),
            tile_x: read_f64(value, "tileX").map(|v| v.floor() as i64).unwrap_or(0),
            tile_y: read_f64(value, "tileY").map(|v| v.floor() as i64).unwrap_or(0),
            offset_u: read_f64(value, "offsetU"),
            offset_v: read_f64(value, "offsetV"),
            offset_x: read_f64(value, "offsetX"),
            offset_z: read_f64(value, "offsetZ"),
            tangent_factor: read_f64(value, "tangentFactor").unwrap_or(1.0),
        })
    }
}

/// Reads every road object in a JSON array; anything else yields no roads.
pub fn read_roads(value: &Value) -> Vec<RoadInput> {
    value
        .as_array()
        .map(|roads| roads.iter().filter_map(RoadInput::from_value).collect())
        .unwrap_or_default()
}

/// Reads a finite number, accepting numeric strings.
pub(crate) fn read_f64(value: &Value, key: &str) -> Option<f64> {
    let v = match value.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then(|| v)
}

/// Reads a boolean; other JSON types are ignored.
pub(crate) fn read_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

/// Reads a string, accepting numbers as their decimal representation.
pub(crate) fn read_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads an array of strings, skipping any entries that are not strings.
pub(crate) fn read_string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn read_lanes(value: &Value, key: &str) -> u32 {
    read_f64(value, key)
        .map(|v| v.round().clamp(0.0, MAX_LANES as f64) as u32)
        .unwrap_or(DEFAULT_LANES)
}
