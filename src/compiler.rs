use crate::input::{read_roads, RoadInput};
use crate::junction::{assemble_junctions, extract_candidates, EndpointCandidate, Junction};
use crate::primitive::{emit_primitives, Primitive, Scene};
use crate::road::{build_segments, find_corners, Corner, Road, Segment};
use crate::settings::Settings;
use crate::trim::{trim_segments, TrimOverlap};
use crate::{EndpointKey, EndpointSet, SegmentKey, SegmentSet};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Everything derived from one set of roads and settings.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    /// The resolved settings the snapshot was compiled with.
    pub settings: Settings,
    /// Sorted by ID.
    pub roads: Vec<Road>,
    /// Sorted by ID.
    pub segments: Vec<Segment>,
    pub primitives: Vec<Primitive>,
    pub trim: TrimSummary,
    /// Sorted by ID.
    pub junctions: Vec<Junction>,
    pub junction_candidates: JunctionCandidates,
}

/// The outcome of the trim stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimSummary {
    pub enabled: bool,
    pub threshold: f64,
    /// Sorted by ID.
    pub overlaps: Vec<TrimOverlap>,
}

/// The raw material of junction assembly.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionCandidates {
    /// Sorted by ID.
    pub endpoints: Vec<EndpointCandidate>,
    /// Sorted by ID.
    pub corners: Vec<Corner>,
}

/// Compiles authored roads into road and junction geometry.
///
/// The result depends only on the content of `roads` and `settings`, not on the order
/// of the roads.
pub fn compile(roads: &[RoadInput], settings: &Settings) -> Derived {
    let mut inputs = roads.iter().sorted_by(|a, b| a.content_cmp(b)).collect::<Vec<_>>();
    let count = inputs.len();
    inputs.dedup_by(|b, a| a.id == b.id);
    if inputs.len() < count {
        log::warn!("ignoring {} roads with duplicate IDs", count - inputs.len());
    }

    // Roads, segments and corners
    let mut segments = SegmentSet::with_key();
    let mut corners = vec![];
    let roads = inputs
        .into_iter()
        .map(|input| {
            let mut road = Road::new(input, settings);
            let built = build_segments(&road, settings);
            corners.extend(find_corners(&built));
            road.segment_ids = built.iter().map(|s| s.id.clone()).collect();
            for segment in built {
                segments.insert(segment);
            }
            road
        })
        .collect::<Vec<_>>();
    corners.sort_by(|a: &Corner, b| a.id.cmp(&b.id));
    let order = sorted_keys(&segments, |s| &s.id);
    log::debug!(
        "built {} segments and {} corners from {} roads",
        order.len(),
        corners.len(),
        roads.len()
    );

    // Trim
    let mut overlaps = trim_segments(&mut segments, &order, &corners, settings);
    overlaps.sort_by(|a, b| a.id.cmp(&b.id));

    // Junctions
    let mut endpoints = EndpointSet::with_key();
    if settings.junctions.enabled {
        for key in &order {
            for candidate in extract_candidates(&segments[*key]) {
                endpoints.insert(candidate);
            }
        }
    }
    let endpoint_order = sorted_keys(&endpoints, |e| &e.id);
    let junctions = assemble_junctions(&endpoints, &endpoint_order, &corners, settings);

    let primitives = emit_primitives(&Scene {
        settings,
        roads: &roads,
        segments: order.iter().map(|k| (segments[*k].id.as_str(), &segments[*k])).collect(),
        overlaps: &overlaps,
        junctions: &junctions,
        endpoints: endpoint_order
            .iter()
            .map(|k| (endpoints[*k].id.as_str(), &endpoints[*k]))
            .collect(),
        corners: &corners,
    });

    Derived {
        settings: settings.clone(),
        roads,
        segments: order.iter().filter_map(|k| segments.remove(*k)).collect(),
        primitives,
        trim: TrimSummary {
            enabled: settings.trim.enabled,
            threshold: settings.trim.threshold,
            overlaps,
        },
        junctions,
        junction_candidates: JunctionCandidates {
            endpoints: endpoint_order.iter().filter_map(|k| endpoints.remove(*k)).collect(),
            corners,
        },
    }
}

/// Compiles from raw JSON trees, reading both leniently.
pub fn compile_value(roads: &Value, settings: &Value) -> Derived {
    compile(&read_roads(roads), &Settings::resolve(settings))
}

/// The keys of an arena, ordered by a string ID.
fn sorted_keys<K: slotmap::Key, V>(
    set: &slotmap::SlotMap<K, V>,
    id: impl Fn(&V) -> &String,
) -> Vec<K> {
    let by_id: BTreeMap<&String, K> = set.iter().map(|(k, v)| (id(v), k)).collect();
    by_id.into_values().collect()
}
