//! Resolution of the configuration tree into fully-defaulted [Settings].

use crate::input::{read_bool, read_f64, read_string, read_string_list};
use serde::Serialize;
use serde_json::Value;

/// Default edge length of one tile, in world units.
const DEFAULT_TILE_SIZE: f64 = 24.0;

/// Default width of a single lane, in world units.
const DEFAULT_LANE_WIDTH: f64 = 4.8;

/// Default asphalt margin beyond the outer lane edge, as a fraction of the lane width.
const DEFAULT_MARGIN_FACTOR: f64 = 0.1;

/// Default scale from fillet geometry to junction thresholds.
const DEFAULT_THRESHOLD_FACTOR: f64 = 1.5;

static NULL: Value = Value::Null;

/// The resolved compiler configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub tile_size: f64,
    pub lane_width: f64,
    pub margin_factor: f64,
    pub origin: Origin,
    pub flags: RenderFlags,
    pub trim: TrimSettings,
    pub junctions: JunctionSettings,
}

/// World position of tile (0, 0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Origin {
    pub x: f64,
    pub z: f64,
}

/// Which always-on geometry is emitted as primitives.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFlags {
    pub centerline: bool,
    pub direction_lines: bool,
    pub lane_edges: bool,
    pub asphalt_edges: bool,
    pub points: bool,
    pub asphalt: bool,
    pub junction_surfaces: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrimSettings {
    pub enabled: bool,
    /// Extra clearance around each segment's asphalt when detecting overlaps.
    pub threshold: f64,
    pub debug: TrimDebug,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimDebug {
    pub raw_segments: bool,
    pub strips: bool,
    pub overlaps: bool,
    pub removed: bool,
    pub kept: bool,
    pub dropped: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionSettings {
    pub enabled: bool,
    pub threshold_factor: f64,
    pub min_threshold: f64,
    /// Upper bound for corner cuts and clustering distances; serializes as `null` when unbounded.
    pub max_threshold: f64,
    pub auto_create: bool,
    /// Fillet radius as a fraction of the widest asphalt half-width, within `[0, 1]`.
    pub fillet_radius_factor: f64,
    pub merged_connector_ids: Vec<String>,
    pub manual_junctions: Vec<ManualJunction>,
    pub hidden_junction_ids: Vec<String>,
    pub suppressed_auto_junction_ids: Vec<String>,
    pub debug: JunctionDebug,
}

/// A junction explicitly assembled by the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualJunction {
    /// Explicit ID; when `None` the ID is derived from the candidate IDs.
    pub id: Option<String>,
    /// Endpoint candidate IDs or corner IDs, in authored order.
    pub candidate_ids: Vec<String>,
    pub asphalt_visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionDebug {
    pub boundary: bool,
    pub endpoints: bool,
    pub edge_order: bool,
    pub connectors: bool,
    pub tat_tangents: bool,
    pub tat_arcs: bool,
    pub corners: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            lane_width: DEFAULT_LANE_WIDTH,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            origin: Origin::default(),
            flags: RenderFlags::default(),
            trim: TrimSettings::default(),
            junctions: JunctionSettings::default(),
        }
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            centerline: true,
            direction_lines: true,
            lane_edges: true,
            asphalt_edges: true,
            points: true,
            asphalt: true,
            junction_surfaces: true,
        }
    }
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.0,
            debug: TrimDebug::default(),
        }
    }
}

impl Default for JunctionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_factor: DEFAULT_THRESHOLD_FACTOR,
            min_threshold: 0.0,
            max_threshold: f64::INFINITY,
            auto_create: true,
            fillet_radius_factor: 1.0,
            merged_connector_ids: vec![],
            manual_junctions: vec![],
            hidden_junction_ids: vec![],
            suppressed_auto_junction_ids: vec![],
            debug: JunctionDebug::default(),
        }
    }
}

impl Settings {
    /// Resolves a configuration tree. Never fails; anything missing or malformed keeps its default.
    pub fn resolve(value: &Value) -> Self {
        let d = Self::default();
        let origin = value.get("origin").unwrap_or(&NULL);
        Self {
            tile_size: positive(read_f64(value, "tileSize"), d.tile_size),
            lane_width: positive(read_f64(value, "laneWidth"), d.lane_width),
            margin_factor: non_negative(read_f64(value, "marginFactor"), d.margin_factor),
            origin: Origin {
                x: read_f64(origin, "x").unwrap_or(0.0),
                z: read_f64(origin, "z").unwrap_or(0.0),
            },
            flags: RenderFlags::resolve(value.get("flags").unwrap_or(&NULL)),
            trim: TrimSettings::resolve(value.get("trim").unwrap_or(&NULL)),
            junctions: JunctionSettings::resolve(value.get("junctions").unwrap_or(&NULL)),
        }
    }

    /// Margin between the outer lane edge and the asphalt edge.
    pub fn margin(&self) -> f64 {
        self.lane_width * self.margin_factor
    }

    /// The minimum length of a trimmed piece that is still rendered.
    pub fn snap_step(&self) -> f64 {
        self.tile_size / 10.0
    }
}

impl RenderFlags {
    fn resolve(value: &Value) -> Self {
        let d = Self::default();
        Self {
            centerline: read_bool(value, "centerline").unwrap_or(d.centerline),
            direction_lines: read_bool(value, "directionLines").unwrap_or(d.direction_lines),
            lane_edges: read_bool(value, "laneEdges").unwrap_or(d.lane_edges),
            asphalt_edges: read_bool(value, "asphaltEdges").unwrap_or(d.asphalt_edges),
            points: read_bool(value, "points").unwrap_or(d.points),
            asphalt: read_bool(value, "asphalt").unwrap_or(d.asphalt),
            junction_surfaces: read_bool(value, "junctionSurfaces").unwrap_or(d.junction_surfaces),
        }
    }
}

impl TrimSettings {
    fn resolve(value: &Value) -> Self {
        let d = Self::default();
        let debug = value.get("debug").unwrap_or(&NULL);
        let flag = |key| read_bool(debug, key).unwrap_or(false);
        Self {
            enabled: read_bool(value, "enabled").unwrap_or(d.enabled),
            threshold: non_negative(read_f64(value, "threshold"), d.threshold),
            debug: TrimDebug {
                raw_segments: flag("rawSegments"),
                strips: flag("strips"),
                overlaps: flag("overlaps"),
                removed: flag("removed"),
                kept: flag("kept"),
                dropped: flag("dropped"),
            },
        }
    }
}

impl JunctionSettings {
    fn resolve(value: &Value) -> Self {
        let d = Self::default();
        let debug = value.get("debug").unwrap_or(&NULL);
        let flag = |key| read_bool(debug, key).unwrap_or(false);
        let manual_junctions = value
            .get("manualJunctions")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ManualJunction::resolve).collect())
            .unwrap_or_default();
        Self {
            enabled: read_bool(value, "enabled").unwrap_or(d.enabled),
            threshold_factor: non_negative(read_f64(value, "thresholdFactor"), d.threshold_factor),
            min_threshold: non_negative(read_f64(value, "minThreshold"), d.min_threshold),
            max_threshold: positive(read_f64(value, "maxThreshold"), d.max_threshold),
            auto_create: read_bool(value, "autoCreate").unwrap_or(d.auto_create),
            fillet_radius_factor: read_f64(value, "filletRadiusFactor")
                .unwrap_or(d.fillet_radius_factor)
                .clamp(0.0, 1.0),
            merged_connector_ids: read_string_list(value, "mergedConnectorIds"),
            manual_junctions,
            hidden_junction_ids: read_string_list(value, "hiddenJunctionIds"),
            suppressed_auto_junction_ids: read_string_list(value, "suppressedAutoJunctionIds"),
            debug: JunctionDebug {
                boundary: flag("boundary"),
                endpoints: flag("endpoints"),
                edge_order: flag("edgeOrder"),
                connectors: flag("connectors"),
                tat_tangents: flag("tatTangents"),
                tat_arcs: flag("tatArcs"),
                corners: flag("corners"),
            },
        }
    }
}

impl ManualJunction {
    fn resolve(value: &Value) -> Option<Self> {
        value.as_object()?;
        Some(Self {
            id: read_string(value, "id").filter(|id| !id.is_empty()),
            candidate_ids: read_string_list(value, "candidateIds"),
            asphalt_visible: read_bool(value, "asphaltVisible").unwrap_or(true),
        })
    }
}

fn positive(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(default)
}

fn non_negative(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| *v >= 0.0).unwrap_or(default)
}
