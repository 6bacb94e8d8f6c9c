//! End-to-end tests of the road geometry compiler.

use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use road_geometry::math::{is_simple, signed_area};
use road_geometry::settings::ManualJunction;
use road_geometry::{
    compile, Derived, EdgeLabel, Interval, JunctionKind, PointInput, PrimitiveKind, RoadInput,
    Settings, SurfaceMethod,
};

fn road(id: &str, points: &[(i64, i64)]) -> RoadInput {
    RoadInput::new(
        id,
        points
            .iter()
            .map(|&(x, y)| PointInput::tile(x, y, 0.5, 0.5))
            .collect(),
    )
}

/// A crossing, a T and a detached elbow.
fn network() -> Vec<RoadInput> {
    vec![
        road("a", &[(0, 2), (6, 2)]),
        road("b", &[(2, 0), (2, 4)]),
        road("c", &[(8, 0), (11, 0), (11, 3)]),
        RoadInput::new(
            "d",
            vec![
                PointInput::tile(4, 2, 0.0, 0.5),
                PointInput::tile(4, 5, 0.0, 0.5),
            ],
        ),
    ]
}

fn crossing() -> Vec<RoadInput> {
    vec![road("a", &[(0, 2), (4, 2)]), road("b", &[(2, 0), (2, 4)])]
}

fn to_json(derived: &Derived) -> String {
    serde_json::to_string(derived).unwrap()
}

/// Test that the output does not depend on the order of the roads.
#[test]
fn output_is_independent_of_road_order() {
    let settings = Settings::default();
    let expected = to_json(&compile(&network(), &settings));
    assert_eq!(expected, to_json(&compile(&network(), &settings)));

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..8 {
        let mut roads = network();
        roads.shuffle(&mut rng);
        assert_eq!(expected, to_json(&compile(&roads, &settings)));
    }

    // Roads sharing an ID, including the empty one, keep the same winner in any order
    let mut roads = network();
    roads.push(road("a", &[(0, 3), (6, 3)]));
    roads.push(road("", &[(0, 7), (3, 7)]));
    roads.push(road("", &[(0, 8), (3, 8)]));
    let expected = compile(&roads, &settings);
    assert_eq!(expected.roads.len(), 5);
    assert_eq!(expected.roads.iter().find(|r| r.id == "a").unwrap().points[0].world.y, 60.0);
    let expected = to_json(&expected);
    for _ in 0..8 {
        roads.shuffle(&mut rng);
        assert_eq!(expected, to_json(&compile(&roads, &settings)));
    }
}

/// Test that the removed, kept and dropped spans of every segment tile [0, 1].
#[test]
fn trim_partitions_every_segment() {
    let derived = compile(&network(), &Settings::default());
    assert!(derived.segments.iter().any(|s| s.trim.trimmed));
    for segment in &derived.segments {
        let trim = &segment.trim;
        let mut spans: Vec<Interval<f64>> = trim.removed.iter().map(|r| r.span).collect();
        spans.extend(trim.kept.iter().chain(&trim.dropped).map(|p| p.span));
        spans.sort_by(|a, b| a.min.total_cmp(&b.min));

        let mut cursor = 0.0;
        for span in &spans {
            assert_approx_eq!(span.min, cursor, 1e-6);
            cursor = span.max;
        }
        assert_approx_eq!(cursor, 1.0, 1e-6);
    }
}

/// Test that disabling trim leaves every asphalt box whole.
#[test]
fn disabled_trim_keeps_boxes() {
    let mut settings = Settings::default();
    settings.trim.enabled = false;
    let derived = compile(&network(), &settings);
    assert!(derived.trim.overlaps.is_empty());
    for segment in &derived.segments {
        assert_eq!(segment.trim.kept.len(), 1);
        assert!(segment.trim.removed.is_empty());
        assert_eq!(segment.trim.kept[0].obb.corners, segment.obb.corners);
    }
}

/// Test a lone straight road end to end.
#[test]
fn lone_road() {
    let derived = compile(&[road("solo", &[(0, 0), (2, 0), (5, 0)])], &Settings::default());
    assert_eq!(derived.segments.len(), 2);
    assert!(derived.trim.overlaps.is_empty());
    assert!(derived.junction_candidates.corners.is_empty());
    assert!(derived.junctions.is_empty());
    for segment in &derived.segments {
        assert!(!segment.trim.trimmed);
        assert_eq!(segment.trim.kept.len(), 1);
        assert_eq!(segment.trim.kept[0].obb.corners, segment.obb.corners);
    }
    let kinds = derived.primitives.iter().map(|p| p.kind()).collect::<Vec<_>>();
    assert!(kinds.contains(&PrimitiveKind::ControlPoints));
    assert!(kinds.contains(&PrimitiveKind::Centerline));
    assert_eq!(kinds.iter().filter(|k| **k == PrimitiveKind::Asphalt).count(), 2);
}

/// Test the surface of a right-angle bend.
#[test]
fn right_angle_bend() {
    let derived = compile(&[road("r", &[(0, 0), (3, 0), (3, 3)])], &Settings::default());
    assert_eq!(derived.junction_candidates.corners.len(), 1);
    assert_eq!(derived.junctions.len(), 1);

    let junction = &derived.junctions[0];
    assert_eq!(junction.kind, JunctionKind::Corner);
    assert_eq!(junction.endpoints.len(), 2);
    let surface = junction.surface.as_ref().unwrap();
    assert_eq!(surface.method, SurfaceMethod::Tat);
    let labels = surface.edges.iter().map(|e| e.label).collect::<Vec<_>>();
    assert_eq!(labels, vec![EdgeLabel::Outer, EdgeLabel::Inner]);
    assert!(is_simple(&surface.polygon));
    assert!(signed_area(&surface.polygon) > 0.0);

    let radii = surface
        .edges
        .iter()
        .map(|e| e.arc.unwrap().radius)
        .collect::<Vec<_>>();
    assert_approx_eq!(radii[0], 13.2, 1e-9);
    assert_approx_eq!(radii[1], 2.64, 1e-9);

    assert!(derived
        .primitives
        .iter()
        .any(|p| p.kind() == PrimitiveKind::JunctionSurface));
}

/// Test that boxes which merely touch are not trimmed.
#[test]
fn touching_roads_do_not_overlap() {
    let a = road("a", &[(0, 0), (3, 0)]);
    let b = RoadInput::new(
        "b",
        vec![
            PointInput::tile(0, 0, 0.5, 0.94),
            PointInput::tile(3, 0, 0.5, 0.94),
        ],
    );
    let derived = compile(&[a, b], &Settings::default());
    assert!(derived.trim.overlaps.is_empty());
    assert!(derived.segments.iter().all(|s| !s.trim.trimmed));
}

/// Test that a four-way crossing becomes one square junction.
#[test]
fn four_way_crossing() {
    let derived = compile(&crossing(), &Settings::default());
    assert_eq!(derived.trim.overlaps.len(), 1);
    let overlap = &derived.trim.overlaps[0];
    assert_eq!(overlap.id, "ov_a:s0__b:s0");
    assert_approx_eq!(overlap.area, 10.56 * 10.56, 1e-6);

    assert_eq!(derived.junctions.len(), 1);
    let junction = &derived.junctions[0];
    assert_eq!(junction.kind, JunctionKind::Overlap);
    assert_eq!(junction.endpoints.len(), 4);
    assert_eq!(junction.connectors.len(), 6);
    assert_approx_eq!(junction.center.x, 60.0);
    assert_approx_eq!(junction.center.y, 60.0);

    let surface = junction.surface.as_ref().unwrap();
    assert_approx_eq!(signed_area(&surface.polygon), 10.56 * 10.56, 1e-6);
}

/// Test that a T-junction gathers the three ends around the shared overlap.
#[test]
fn t_junction() {
    let derived = compile(&network(), &Settings::default());
    let t = derived
        .junctions
        .iter()
        .find(|j| j.endpoints.iter().any(|e| e.contains("d:s0")))
        .unwrap();
    assert_eq!(t.kind, JunctionKind::Overlap);
    assert_eq!(t.endpoints.len(), 3);
}

/// Test that junction IDs depend only on the set of endpoints.
#[test]
fn junction_ids_are_stable() {
    let auto = compile(&crossing(), &Settings::default());
    let junction = &auto.junctions[0];

    for reversed in [false, true] {
        let mut ids = junction.endpoints.clone();
        if reversed {
            ids.reverse();
        }
        let mut settings = Settings::default();
        settings.junctions.manual_junctions = vec![ManualJunction {
            id: None,
            candidate_ids: ids,
            asphalt_visible: true,
        }];
        let manual = compile(&crossing(), &settings);
        assert_eq!(manual.junctions.len(), 1);
        assert_eq!(manual.junctions[0].kind, JunctionKind::Manual);
        assert_eq!(manual.junctions[0].id, junction.id);
    }
}

/// Test that suppressed and hidden junctions behave differently.
#[test]
fn suppressed_and_hidden_junctions() {
    let auto = compile(&crossing(), &Settings::default());
    let id = auto.junctions[0].id.clone();

    let mut settings = Settings::default();
    settings.junctions.hidden_junction_ids = vec![id.clone()];
    let hidden = compile(&crossing(), &settings);
    assert_eq!(hidden.junctions.len(), 1);
    assert!(!hidden.junctions[0].visible);
    assert!(hidden
        .primitives
        .iter()
        .all(|p| p.kind() != PrimitiveKind::JunctionSurface));

    let mut settings = Settings::default();
    settings.junctions.suppressed_auto_junction_ids = vec![id];
    let suppressed = compile(&crossing(), &settings);
    assert!(suppressed.junctions.is_empty());
}

/// Test that a road doubling back on itself yields a valid surface or none at all.
#[test]
fn hairpin_corner() {
    for offset_v in [0.9, 0.99] {
        let hairpin = RoadInput::new(
            "h",
            vec![
                PointInput::tile(0, 0, 0.5, 0.5),
                PointInput::tile(4, 0, 0.5, 0.5),
                PointInput::tile(0, 0, 0.5, offset_v),
            ],
        );
        let derived = compile(&[hairpin], &Settings::default());
        assert_eq!(derived.junction_candidates.corners.len(), 1);
        for junction in &derived.junctions {
            if let Some(surface) = &junction.surface {
                assert!(is_simple(&surface.polygon));
                assert!(signed_area(&surface.polygon) > 0.0);
            }
        }
    }
}

/// Test that merged connectors are flagged and left out of the connector overlay.
#[test]
fn merged_connectors_are_not_drawn() {
    let drawn = |derived: &Derived| {
        derived
            .primitives
            .iter()
            .filter(|p| p.kind() == PrimitiveKind::Connector)
            .filter_map(|p| p.owner().connector_id.clone())
            .collect::<Vec<_>>()
    };
    let road_of = |derived: &Derived, id: &str| {
        derived
            .junction_candidates
            .endpoints
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.road_id.clone())
            .unwrap()
    };

    let mut settings = Settings::default();
    settings.junctions.debug.connectors = true;
    settings.junctions.merged_connector_ids = vec!["a".into()];
    let derived = compile(&crossing(), &settings);
    let connectors = &derived.junctions[0].connectors;
    assert_eq!(connectors.len(), 6);
    for c in connectors {
        let (ra, rb) = (road_of(&derived, &c.a), road_of(&derived, &c.b));
        assert_eq!(c.merged, ra == "a" && rb == "a", "{} {}", c.a, c.b);
    }
    let merged = connectors.iter().filter(|c| c.merged).map(|c| c.id.clone()).collect::<Vec<_>>();
    assert_eq!(merged.len(), 1);
    assert_eq!(drawn(&derived).len(), 5);
    assert!(!drawn(&derived).contains(&merged[0]));

    // A connector ID works as well as a road ID
    let along_b = connectors
        .iter()
        .find(|c| road_of(&derived, &c.a) == "b" && road_of(&derived, &c.b) == "b")
        .unwrap()
        .id
        .clone();
    settings.junctions.merged_connector_ids.push(along_b.clone());
    let derived = compile(&crossing(), &settings);
    assert_eq!(derived.junctions[0].connectors.iter().filter(|c| c.merged).count(), 2);
    assert_eq!(drawn(&derived).len(), 4);
    assert!(!drawn(&derived).contains(&along_b));

    // Pairs from different roads never merge
    settings.junctions.merged_connector_ids = derived.junctions[0]
        .connectors
        .iter()
        .map(|c| c.id.clone())
        .collect();
    let derived = compile(&crossing(), &settings);
    assert_eq!(derived.junctions[0].connectors.iter().filter(|c| c.merged).count(), 2);
}

/// Test that debug toggles only add primitives.
#[test]
fn debug_flags_add_primitives() {
    let plain = compile(&network(), &Settings::default());
    let settings = Settings::resolve(&serde_json::json!({
        "trim": { "debug": {
            "rawSegments": true, "strips": true, "overlaps": true,
            "removed": true, "kept": true, "dropped": true,
        } },
        "junctions": { "debug": {
            "boundary": true, "endpoints": true, "edgeOrder": true, "connectors": true,
            "tatTangents": true, "tatArcs": true, "corners": true,
        } },
    }));
    let debug = compile(&network(), &settings);
    assert!(debug.primitives.len() > plain.primitives.len());
    assert_eq!(to_json_junctions(&plain), to_json_junctions(&debug));
    for kind in [
        PrimitiveKind::TrimStrip,
        PrimitiveKind::OverlapPolygon,
        PrimitiveKind::Connector,
        PrimitiveKind::TatArc,
        PrimitiveKind::Corner,
    ] {
        assert!(debug.primitives.iter().any(|p| p.kind() == kind), "{:?}", kind);
    }
}

fn to_json_junctions(derived: &Derived) -> String {
    serde_json::to_string(&derived.junctions).unwrap()
}

/// Test the shape of the serialized snapshot.
#[test]
fn snapshot_shape() {
    let value = serde_json::to_value(&compile(&crossing(), &Settings::default())).unwrap();
    for key in [
        "settings",
        "roads",
        "segments",
        "primitives",
        "trim",
        "junctions",
        "junctionCandidates",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    let first = &value["primitives"][0];
    assert_eq!(first["shape"], "points");
    assert_eq!(first["kind"], "controlPoints");
    assert_eq!(first["owner"]["roadId"], "a");
    assert!(first["points"][0]["z"].is_number());
    assert!(value["junctionCandidates"]["endpoints"].as_array().unwrap().len() >= 4);
}
