//! Assembly of junctions from endpoint candidates.

use crate::math::{mean_point, Point2d};
use crate::road::Corner;
use crate::settings::Settings;
use crate::util::stable_hash;
use crate::{EndpointKey, EndpointSet};
use cgmath::prelude::*;
use itertools::Itertools;
use pathfinding::prelude::bfs_reach;
use serde::Serialize;
use slotmap::SecondaryMap;
use std::collections::{BTreeMap, BTreeSet};

pub use candidate::{extract_candidates, EndpointCandidate, PieceEnd};
pub use surface::{build_surface, EdgeLabel, JunctionSurface, SurfaceMethod, TatEdge};

mod candidate;
mod surface;

/// Pairs of endpoints join by proximity within this multiple of their summed radii.
const PROXIMITY_FACTOR: f64 = 0.75;

/// How a junction came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JunctionKind {
    Manual,
    Corner,
    Overlap,
    Proximity,
}

/// A drivable link between two endpoints of a junction.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// `cx_<hash(junctionId, aId, bId)>`.
    pub id: String,
    pub a: String,
    pub b: String,
    /// Whether the pair is a continuation of one road, drawn by the road itself.
    pub merged: bool,
}

/// Two or more endpoints joined into one drivable area.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Junction {
    /// The explicit manual ID, or `jn_<hash(sorted endpoint ids)>`.
    pub id: String,
    pub kind: JunctionKind,
    /// False for junctions listed as hidden; they emit no surface.
    pub visible: bool,
    /// False when a manual junction asks for its asphalt to be left out.
    pub asphalt_visible: bool,
    pub corner_id: Option<String>,
    #[serde(with = "crate::util::xz")]
    pub center: Point2d,
    /// Endpoint IDs, counter-clockwise around the centre.
    pub endpoints: Vec<String>,
    pub connectors: Vec<Connector>,
    pub surface: Option<JunctionSurface>,
}

/// A group of endpoints on its way to becoming a junction.
struct Draft {
    id: String,
    kind: JunctionKind,
    members: Vec<EndpointKey>,
    corner: Option<usize>,
    asphalt_visible: bool,
}

/// The stable ID of an automatic junction.
pub fn junction_id<S: AsRef<str>>(endpoint_ids: &[S]) -> String {
    let sorted = endpoint_ids
        .iter()
        .map(|id| AsRef::<str>::as_ref(id))
        .sorted()
        .dedup()
        .collect::<Vec<_>>();
    format!("jn_{}", stable_hash(&sorted))
}

/// The stable ID of a connector.
pub fn connector_id(junction_id: &str, a: &str, b: &str) -> String {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    format!("cx_{}", stable_hash(&[junction_id, a, b]))
}

struct Assembler<'a> {
    endpoints: &'a EndpointSet,
    order: &'a [EndpointKey],
    corners: &'a [Corner],
    settings: &'a Settings,
    by_id: BTreeMap<&'a str, EndpointKey>,
    drafts: Vec<Draft>,
    /// Which draft each endpoint currently belongs to.
    owner: SecondaryMap<EndpointKey, usize>,
}

impl<'a> Assembler<'a> {
    fn new(
        endpoints: &'a EndpointSet,
        order: &'a [EndpointKey],
        corners: &'a [Corner],
        settings: &'a Settings,
    ) -> Self {
        Self {
            endpoints,
            order,
            corners,
            settings,
            by_id: order.iter().map(|k| (endpoints[*k].id.as_str(), *k)).collect(),
            drafts: vec![],
            owner: SecondaryMap::new(),
        }
    }

    fn is_used(&self, key: EndpointKey) -> bool {
        self.owner.contains_key(key)
    }

    fn is_suppressed(&self, id: &str) -> bool {
        self.settings
            .junctions
            .suppressed_auto_junction_ids
            .iter()
            .any(|s| s == id)
    }

    /// The endpoints created by a corner's cut, in ID order.
    fn corner_flanks(&self, corner: &Corner) -> Vec<EndpointKey> {
        self.order
            .iter()
            .copied()
            .filter(|k| self.endpoints[*k].corner_id.as_deref() == Some(corner.id.as_str()))
            .collect()
    }

    fn ids(&self, members: &[EndpointKey]) -> Vec<&'a str> {
        let endpoints = self.endpoints;
        members.iter().map(|k| endpoints[*k].id.as_str()).collect()
    }

    /// Adds a draft, taking its members away from any earlier draft.
    fn claim(&mut self, draft: Draft) {
        let index = self.drafts.len();
        for key in &draft.members {
            if let Some(previous) = self.owner.insert(*key, index) {
                log::debug!(
                    "{} moves from {} to {}",
                    self.endpoints[*key].id,
                    self.drafts[previous].id,
                    draft.id
                );
                self.drafts[previous].members.retain(|k| k != key);
            }
        }
        self.drafts.push(draft);
    }

    fn manual_pass(&mut self) {
        let settings = self.settings;
        for manual in &settings.junctions.manual_junctions {
            let mut members = vec![];
            let mut corner = None;
            for id in &manual.candidate_ids {
                if let Some(key) = self.by_id.get(id.as_str()) {
                    members.push(*key);
                } else if let Some(ci) = self.corners.iter().position(|c| &c.id == id) {
                    members.extend(self.corner_flanks(&self.corners[ci]));
                    corner = corner.or(Some(ci));
                } else {
                    log::warn!("manual junction refers to unknown candidate {}", id);
                }
            }
            let members = members.into_iter().unique().collect::<Vec<_>>();
            if members.is_empty() {
                continue;
            }
            let id = match &manual.id {
                Some(id) => id.clone(),
                None => junction_id(&self.ids(&members)),
            };
            self.claim(Draft {
                id,
                kind: JunctionKind::Manual,
                members,
                corner,
                asphalt_visible: manual.asphalt_visible,
            });
        }
    }

    fn auto(&mut self, kind: JunctionKind, members: Vec<EndpointKey>, corner: Option<usize>) {
        let id = junction_id(&self.ids(&members));
        if self.is_suppressed(&id) {
            log::debug!("skipping suppressed junction {}", id);
            return;
        }
        self.claim(Draft {
            id,
            kind,
            members,
            corner,
            asphalt_visible: true,
        });
    }

    fn corner_pass(&mut self) {
        let corners = self.corners.iter().enumerate().sorted_by(|(_, a), (_, b)| a.id.cmp(&b.id));
        for (ci, corner) in corners {
            if self.is_suppressed(&corner.id) {
                continue;
            }
            let flanks = self.corner_flanks(corner);
            if flanks.len() == 2 && flanks.iter().all(|k| !self.is_used(*k)) {
                self.auto(JunctionKind::Corner, flanks, Some(ci));
            }
        }
    }

    fn overlap_pass(&mut self) {
        let mut groups: BTreeMap<String, Vec<EndpointKey>> = BTreeMap::new();
        for key in self.order.iter().copied().filter(|k| !self.is_used(*k)) {
            let sources = &self.endpoints[key].overlap_sources;
            if !sources.is_empty() {
                groups.entry(sources.join("|")).or_default().push(key);
            }
        }
        for members in groups.into_values().filter(|m| m.len() >= 2) {
            self.auto(JunctionKind::Overlap, members, None);
        }
    }

    /// The largest distance at which two endpoints join by proximity.
    fn proximity_threshold(&self, a: &EndpointCandidate, b: &EndpointCandidate) -> f64 {
        let j = &self.settings.junctions;
        let base = j.min_threshold.max(self.settings.lane_width * j.threshold_factor);
        ((a.connect_radius + b.connect_radius) * PROXIMITY_FACTOR)
            .clamp(base, j.max_threshold.max(base))
    }

    fn proximity_pass(&mut self) {
        let free = self
            .order
            .iter()
            .copied()
            .filter(|k| !self.is_used(*k))
            .collect::<Vec<_>>();
        let mut visited = BTreeSet::new();
        let mut clusters = vec![];
        for &seed in &free {
            if visited.contains(&seed) {
                continue;
            }
            let cluster = bfs_reach(seed, |&k| {
                let a = &self.endpoints[k];
                free.iter()
                    .copied()
                    .filter(|&o| {
                        let b = &self.endpoints[o];
                        o != k
                            && b.piece_id != a.piece_id
                            && a.position.distance(b.position) <= self.proximity_threshold(a, b)
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
            visited.extend(cluster.iter().copied());
            if cluster.len() >= 2 {
                clusters.push(cluster);
            }
        }
        for mut cluster in clusters {
            cluster.sort_by(|a, b| self.endpoints[*a].id.cmp(&self.endpoints[*b].id));
            self.auto(JunctionKind::Proximity, cluster, None);
        }
    }

    fn finish(self) -> Vec<Junction> {
        let settings = self.settings;
        let mut junctions = self
            .drafts
            .iter()
            .filter(|d| d.members.len() >= 2)
            .filter_map(|d| self.build(d, settings))
            .collect::<Vec<_>>();
        junctions.sort_by(|a, b| a.id.cmp(&b.id));
        junctions
    }

    fn build(&self, draft: &Draft, settings: &Settings) -> Option<Junction> {
        let mut members = draft.members.iter().map(|k| &self.endpoints[*k]).collect::<Vec<_>>();
        members.sort_by(|a, b| a.id.cmp(&b.id));

        let corner = draft.corner.map(|ci| &self.corners[ci]);
        let mut points = members.iter().map(|e| e.position).collect::<Vec<_>>();
        points.extend(corner.map(|c| c.position));
        let center = mean_point(&points)?;

        let angle = |p: Point2d| {
            let v = p - center;
            v.y.atan2(v.x)
        };
        members.sort_by(|a, b| {
            angle(a.position)
                .total_cmp(&angle(b.position))
                .then_with(|| a.id.cmp(&b.id))
        });

        let merged_ids = &settings.junctions.merged_connector_ids;
        let connectors = members
            .iter()
            .tuple_combinations()
            .map(|(a, b)| {
                let id = connector_id(&draft.id, &a.id, &b.id);
                let merged = a.road_id == b.road_id
                    && merged_ids.iter().any(|m| *m == id || *m == a.road_id);
                let (a, b) = if a.id <= b.id { (a, b) } else { (b, a) };
                Connector {
                    id,
                    a: a.id.clone(),
                    b: b.id.clone(),
                    merged,
                }
            })
            .collect();

        let visible = !settings.junctions.hidden_junction_ids.contains(&draft.id);
        let surface = if visible { build_surface(&draft.id, &members) } else { None };
        log::trace!("junction {} with {} endpoints", draft.id, members.len());

        Some(Junction {
            id: draft.id.clone(),
            kind: draft.kind,
            visible,
            asphalt_visible: draft.asphalt_visible,
            corner_id: corner.map(|c| c.id.clone()),
            center,
            endpoints: members.iter().map(|e| e.id.clone()).collect(),
            connectors,
            surface,
        })
    }
}

/// Groups endpoint candidates into junctions: manual ones first, then corners, shared
/// overlaps and proximity. Returns the junctions sorted by ID.
///
/// `order` lists the endpoint keys sorted by endpoint ID.
pub fn assemble_junctions(
    endpoints: &EndpointSet,
    order: &[EndpointKey],
    corners: &[Corner],
    settings: &Settings,
) -> Vec<Junction> {
    if !settings.junctions.enabled {
        return vec![];
    }
    let mut assembler = Assembler::new(endpoints, order, corners, settings);
    assembler.manual_pass();
    if settings.junctions.auto_create {
        assembler.corner_pass();
        assembler.overlap_pass();
        assembler.proximity_pass();
    }
    let junctions = assembler.finish();
    log::debug!("assembled {} junctions from {} endpoints", junctions.len(), order.len());
    junctions
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input::{PointInput, RoadInput};
    use crate::road::{build_segments, find_corners, Road};
    use crate::settings::ManualJunction;
    use crate::trim::trim_segments;
    use slotmap::SlotMap;

    fn run(roads: &[RoadInput], settings: &Settings) -> (EndpointSet, Vec<Junction>) {
        let mut set = SlotMap::with_key();
        let mut corners = vec![];
        for input in roads {
            let segments = build_segments(&Road::new(input, settings), settings);
            corners.extend(find_corners(&segments));
            for s in segments {
                set.insert(s);
            }
        }
        let order = set.keys().sorted_by(|a, b| set[*a].id.cmp(&set[*b].id)).collect::<Vec<_>>();
        trim_segments(&mut set, &order, &corners, settings);

        let mut endpoints: EndpointSet = SlotMap::with_key();
        for candidate in order.iter().flat_map(|k| extract_candidates(&set[*k])) {
            endpoints.insert(candidate);
        }
        let keys = endpoints
            .keys()
            .sorted_by(|a, b| endpoints[*a].id.cmp(&endpoints[*b].id))
            .collect::<Vec<_>>();
        let junctions = assemble_junctions(&endpoints, &keys, &corners, settings);
        (endpoints, junctions)
    }

    fn elbow() -> RoadInput {
        RoadInput::new(
            "r",
            vec![
                PointInput::tile(0, 0, 0.5, 0.5),
                PointInput::tile(3, 0, 0.5, 0.5),
                PointInput::tile(3, 3, 0.5, 0.5),
            ],
        )
    }

    #[test]
    fn ids_ignore_order() {
        assert_eq!(junction_id(&["b", "a", "c"]), junction_id(&["c", "b", "a", "a"]));
        assert_eq!(connector_id("j", "x", "y"), connector_id("j", "y", "x"));
        assert_ne!(connector_id("j", "x", "y"), connector_id("k", "x", "y"));
    }

    #[test]
    fn corner_becomes_junction() {
        let (endpoints, junctions) = run(&[elbow()], &Settings::default());
        assert_eq!(endpoints.len(), 4);
        assert_eq!(junctions.len(), 1);
        let j = &junctions[0];
        assert_eq!(j.kind, JunctionKind::Corner);
        assert_eq!(j.corner_id.as_deref(), Some("cn_r__r:p1"));
        assert_eq!(j.connectors.len(), 1);
        let surface = j.surface.as_ref().unwrap();
        assert_eq!(surface.method, SurfaceMethod::Tat);
        assert_eq!(surface.edges.len(), 2);
    }

    #[test]
    fn merged_pairs_follow_the_allow_list() {
        let (_, junctions) = run(&[elbow()], &Settings::default());
        assert!(!junctions[0].connectors[0].merged);

        let mut settings = Settings::default();
        settings.junctions.merged_connector_ids = vec!["r".into()];
        let (_, junctions) = run(&[elbow()], &settings);
        assert!(junctions[0].connectors[0].merged);

        let id = junctions[0].connectors[0].id.clone();
        settings.junctions.merged_connector_ids = vec![id];
        let (_, junctions) = run(&[elbow()], &settings);
        assert!(junctions[0].connectors[0].merged);
    }

    #[test]
    fn hidden_junction_has_no_surface() {
        let (_, junctions) = run(&[elbow()], &Settings::default());
        let mut settings = Settings::default();
        settings.junctions.hidden_junction_ids = vec![junctions[0].id.clone()];
        let (_, hidden) = run(&[elbow()], &settings);
        assert!(!hidden[0].visible);
        assert!(hidden[0].surface.is_none());
    }

    #[test]
    fn manual_junction_claims_corner() {
        let mut settings = Settings::default();
        settings.junctions.manual_junctions = vec![ManualJunction {
            id: Some("mine".into()),
            candidate_ids: vec!["cn_r__r:p1".into()],
            asphalt_visible: false,
        }];
        let (_, junctions) = run(&[elbow()], &settings);
        assert_eq!(junctions.len(), 1);
        assert_eq!(junctions[0].id, "mine");
        assert_eq!(junctions[0].kind, JunctionKind::Manual);
        assert!(!junctions[0].asphalt_visible);
        assert_eq!(junctions[0].endpoints.len(), 2);
    }

    #[test]
    fn later_manual_claim_wins() {
        let (endpoints, _) = run(&[elbow()], &Settings::default());
        let cut = endpoints
            .values()
            .filter(|e| e.corner_id.is_some())
            .map(|e| e.id.clone())
            .sorted()
            .collect::<Vec<_>>();
        let mut settings = Settings::default();
        settings.junctions.manual_junctions = vec![
            ManualJunction {
                id: Some("first".into()),
                candidate_ids: cut.clone(),
                asphalt_visible: true,
            },
            ManualJunction {
                id: Some("second".into()),
                candidate_ids: vec![cut[0].clone(), "ep_r:s0__a".into()],
                asphalt_visible: true,
            },
        ];
        let (_, junctions) = run(&[elbow()], &settings);
        // "first" is left with a single endpoint
        assert_eq!(junctions.len(), 1);
        assert_eq!(junctions[0].id, "second");
    }

    #[test]
    fn nearby_ends_join_by_proximity() {
        let a = RoadInput::new(
            "a",
            vec![PointInput::tile(0, 0, 0.5, 0.5), PointInput::tile(2, 0, 0.5, 0.5)],
        );
        let b = RoadInput::new(
            "b",
            vec![PointInput::tile(2, 0, 0.8, 0.5), PointInput::tile(2, 2, 0.8, 0.5)],
        );
        let (_, junctions) = run(&[a, b], &Settings::default());
        let j = junctions
            .iter()
            .find(|j| j.kind == JunctionKind::Proximity)
            .unwrap();
        assert_eq!(j.endpoints.len(), 2);
        assert!(j.endpoints.contains(&"ep_a:s0__b".to_string()));
    }
}
