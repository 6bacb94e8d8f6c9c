//! Flat drawing primitives for everything the compiler produces.

use crate::junction::{EndpointCandidate, Junction};
use crate::math::Point2d;
use crate::road::{Corner, LineKind, Road, Segment};
use crate::settings::Settings;
use crate::trim::{strip, TrimOverlap};
use serde::Serialize;
use std::collections::BTreeMap;

/// What a primitive depicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    ControlPoints,
    Centerline,
    DirectionLine,
    LaneDivider,
    LaneEdge,
    AsphaltEdge,
    Asphalt,
    JunctionSurface,
    RawSegment,
    TrimStrip,
    OverlapPolygon,
    OverlapAnchor,
    RemovedPiece,
    KeptPiece,
    DroppedPiece,
    JunctionBoundary,
    JunctionEndpoints,
    JunctionEdgeOrder,
    Connector,
    TatTangent,
    TatArc,
    Corner,
}

/// The artifacts a primitive belongs to.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tat_id: Option<String>,
}

/// A shape to draw.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Primitive {
    Polyline {
        id: String,
        kind: PrimitiveKind,
        owner: Owner,
        #[serde(with = "crate::util::xz_seq")]
        points: Vec<Point2d>,
        closed: bool,
    },
    Points {
        id: String,
        kind: PrimitiveKind,
        owner: Owner,
        #[serde(with = "crate::util::xz_seq")]
        points: Vec<Point2d>,
    },
    Polygon {
        id: String,
        kind: PrimitiveKind,
        owner: Owner,
        #[serde(with = "crate::util::xz_seq")]
        points: Vec<Point2d>,
    },
}

impl Primitive {
    pub fn id(&self) -> &str {
        match self {
            Primitive::Polyline { id, .. }
            | Primitive::Points { id, .. }
            | Primitive::Polygon { id, .. } => id,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Polyline { kind, .. }
            | Primitive::Points { kind, .. }
            | Primitive::Polygon { kind, .. } => *kind,
        }
    }

    pub fn owner(&self) -> &Owner {
        match self {
            Primitive::Polyline { owner, .. }
            | Primitive::Points { owner, .. }
            | Primitive::Polygon { owner, .. } => owner,
        }
    }

    pub fn points(&self) -> &[Point2d] {
        match self {
            Primitive::Polyline { points, .. }
            | Primitive::Points { points, .. }
            | Primitive::Polygon { points, .. } => points,
        }
    }
}

impl Owner {
    fn road(road_id: &str) -> Self {
        Self {
            road_id: Some(road_id.to_owned()),
            ..Default::default()
        }
    }

    fn segment(segment: &Segment) -> Self {
        Self {
            segment_id: Some(segment.id.clone()),
            ..Self::road(&segment.road_id)
        }
    }

    fn junction(junction_id: &str) -> Self {
        Self {
            junction_id: Some(junction_id.to_owned()),
            ..Default::default()
        }
    }
}

/// Everything the emitter draws from.
pub struct Scene<'a> {
    pub settings: &'a Settings,
    /// Sorted by ID.
    pub roads: &'a [Road],
    pub segments: BTreeMap<&'a str, &'a Segment>,
    /// Sorted by ID.
    pub overlaps: &'a [TrimOverlap],
    /// Sorted by ID.
    pub junctions: &'a [Junction],
    pub endpoints: BTreeMap<&'a str, &'a EndpointCandidate>,
    pub corners: &'a [Corner],
}

#[derive(Default)]
struct Emitter {
    out: Vec<Primitive>,
}

impl Emitter {
    fn polyline(
        &mut self,
        id: String,
        kind: PrimitiveKind,
        owner: Owner,
        points: Vec<Point2d>,
        closed: bool,
    ) {
        self.out.push(Primitive::Polyline {
            id,
            kind,
            owner,
            points,
            closed,
        });
    }

    fn points(&mut self, id: String, kind: PrimitiveKind, owner: Owner, points: Vec<Point2d>) {
        self.out.push(Primitive::Points { id, kind, owner, points });
    }

    fn polygon(&mut self, id: String, kind: PrimitiveKind, owner: Owner, points: Vec<Point2d>) {
        self.out.push(Primitive::Polygon { id, kind, owner, points });
    }

    fn road(&mut self, scene: &Scene, road: &Road) {
        if scene.settings.flags.points && !road.points.is_empty() {
            let points = road.points.iter().map(|p| p.world).collect();
            self.points(
                format!("{}:points", road.id),
                PrimitiveKind::ControlPoints,
                Owner::road(&road.id),
                points,
            );
        }
        for segment in road.segment_ids.iter().filter_map(|id| scene.segments.get(id.as_str())) {
            self.segment(scene, segment);
        }
    }

    fn segment(&mut self, scene: &Scene, segment: &Segment) {
        let flags = &scene.settings.flags;
        let trim = &scene.settings.trim;

        for (i, line) in segment.lines.iter().enumerate() {
            let (kind, shown) = match line.kind {
                LineKind::Centerline => (PrimitiveKind::Centerline, flags.centerline),
                LineKind::ForwardCenterline | LineKind::BackwardCenterline => {
                    (PrimitiveKind::DirectionLine, flags.direction_lines)
                }
                LineKind::LaneDivider => (PrimitiveKind::LaneDivider, flags.lane_edges),
                LineKind::LaneEdge => (PrimitiveKind::LaneEdge, flags.lane_edges),
                LineKind::AsphaltEdge => (PrimitiveKind::AsphaltEdge, flags.asphalt_edges),
            };
            if shown {
                let id = format!("{}:line{}", segment.id, i);
                self.polyline(id, kind, Owner::segment(segment), line.points.to_vec(), false);
            }
        }

        if flags.asphalt {
            for piece in &segment.trim.kept {
                let id = format!("{}:asphalt", piece.id);
                self.polygon(
                    id,
                    PrimitiveKind::Asphalt,
                    Owner::segment(segment),
                    piece.obb.corners.to_vec(),
                );
            }
        }

        if trim.debug.raw_segments {
            let id = format!("{}:raw", segment.id);
            self.polyline(
                id,
                PrimitiveKind::RawSegment,
                Owner::segment(segment),
                segment.obb.corners.to_vec(),
                true,
            );
        }
        if trim.debug.strips && trim.enabled {
            let corners = strip(segment, trim.threshold).corners.to_vec();
            self.polyline(
                format!("{}:strip", segment.id),
                PrimitiveKind::TrimStrip,
                Owner::segment(segment),
                corners,
                true,
            );
        }
        if trim.debug.removed {
            for (i, removed) in segment.trim.removed.iter().enumerate() {
                let corners = segment.obb.cut(removed.span).corners.to_vec();
                let id = format!("{}:removed{}", segment.id, i);
                self.polygon(id, PrimitiveKind::RemovedPiece, Owner::segment(segment), corners);
            }
        }
        if trim.debug.kept {
            for piece in &segment.trim.kept {
                let id = format!("{}:kept", piece.id);
                self.polyline(
                    id,
                    PrimitiveKind::KeptPiece,
                    Owner::segment(segment),
                    piece.obb.corners.to_vec(),
                    true,
                );
            }
        }
        if trim.debug.dropped {
            for piece in &segment.trim.dropped {
                let id = format!("{}:dropped", piece.id);
                self.polygon(
                    id,
                    PrimitiveKind::DroppedPiece,
                    Owner::segment(segment),
                    piece.obb.corners.to_vec(),
                );
            }
        }
    }

    fn overlap(&mut self, overlap: &TrimOverlap) {
        let owner = Owner {
            segment_id: Some(overlap.a.clone()),
            ..Default::default()
        };
        self.polygon(
            format!("{}:polygon", overlap.id),
            PrimitiveKind::OverlapPolygon,
            owner.clone(),
            overlap.polygon.clone(),
        );
        self.points(
            format!("{}:anchor", overlap.id),
            PrimitiveKind::OverlapAnchor,
            owner,
            vec![overlap.anchor],
        );
    }

    fn junction(&mut self, scene: &Scene, junction: &Junction) {
        let flags = &scene.settings.flags;
        let debug = &scene.settings.junctions.debug;
        let owner = Owner::junction(&junction.id);
        let positions = junction
            .endpoints
            .iter()
            .filter_map(|id| scene.endpoints.get(id.as_str()))
            .map(|e| e.position)
            .collect::<Vec<_>>();

        if let Some(surface) = junction.surface.as_ref().filter(|_| junction.visible) {
            if flags.junction_surfaces && junction.asphalt_visible {
                let id = format!("{}:surface", junction.id);
                self.polygon(
                    id,
                    PrimitiveKind::JunctionSurface,
                    owner.clone(),
                    surface.polygon.clone(),
                );
            }
            if debug.boundary {
                let id = format!("{}:boundary", junction.id);
                self.polyline(
                    id,
                    PrimitiveKind::JunctionBoundary,
                    owner.clone(),
                    surface.polygon.clone(),
                    true,
                );
            }
            for edge in &surface.edges {
                let owner = Owner {
                    tat_id: Some(edge.id.clone()),
                    ..owner.clone()
                };
                let Some(arc) = edge.arc else {
                    continue;
                };
                if debug.tat_tangents {
                    if let (Some(first), Some(last)) = (edge.points.first(), edge.points.last()) {
                        let runs = [vec![*first, arc.tangent0], vec![arc.tangent1, *last]];
                        for (i, run) in runs.into_iter().enumerate() {
                            let id = format!("{}:tangent{}", edge.id, i);
                            self.polyline(id, PrimitiveKind::TatTangent, owner.clone(), run, false);
                        }
                    }
                }
                if debug.tat_arcs {
                    let points =
                        crate::math::sample_arc(&arc, crate::math::arc_segments(arc.span_ang));
                    let id = format!("{}:arc", edge.id);
                    self.polyline(id, PrimitiveKind::TatArc, owner, points, false);
                }
            }
        }

        if debug.endpoints && !positions.is_empty() {
            let id = format!("{}:endpoints", junction.id);
            self.points(id, PrimitiveKind::JunctionEndpoints, owner.clone(), positions.clone());
        }
        if debug.edge_order && positions.len() >= 2 {
            let id = format!("{}:order", junction.id);
            self.polyline(
                id,
                PrimitiveKind::JunctionEdgeOrder,
                owner.clone(),
                positions.clone(),
                true,
            );
        }
        if debug.connectors {
            for connector in junction.connectors.iter().filter(|c| !c.merged) {
                let (Some(a), Some(b)) = (
                    scene.endpoints.get(connector.a.as_str()),
                    scene.endpoints.get(connector.b.as_str()),
                ) else {
                    continue;
                };
                let owner = Owner {
                    connector_id: Some(connector.id.clone()),
                    ..owner.clone()
                };
                self.polyline(
                    connector.id.clone(),
                    PrimitiveKind::Connector,
                    owner,
                    vec![a.position, b.position],
                    false,
                );
            }
        }
    }
}

/// Walks every artifact in a fixed order (roads, overlaps, junctions, corners) and
/// collects the primitives enabled by the settings.
pub fn emit_primitives(scene: &Scene) -> Vec<Primitive> {
    let mut emitter = Emitter::default();
    for road in scene.roads {
        emitter.road(scene, road);
    }
    if scene.settings.trim.debug.overlaps {
        for overlap in scene.overlaps {
            emitter.overlap(overlap);
        }
    }
    for junction in scene.junctions {
        emitter.junction(scene, junction);
    }
    if scene.settings.junctions.debug.corners {
        for corner in scene.corners {
            let owner = Owner::road(&corner.road_id);
            emitter.points(corner.id.clone(), PrimitiveKind::Corner, owner, vec![corner.position]);
        }
    }
    log::debug!("emitted {} primitives", emitter.out.len());
    emitter.out
}
