//! Compiles tile-based road centerlines into drivable-surface geometry: asphalt pieces
//! trimmed where roads cross or turn, junction surfaces that fill the gaps, and a flat
//! list of drawing primitives.
//!
//! The compiler is a pure function of its input. Every ID it produces is derived from
//! the content of the input, never from its order.

pub use cgmath;
pub use compiler::{compile, compile_value, Derived, JunctionCandidates, TrimSummary};
pub use input::{read_roads, PointInput, RoadInput};
pub use junction::{
    Connector, EdgeLabel, EndpointCandidate, Junction, JunctionKind, JunctionSurface, PieceEnd,
    SurfaceMethod, TatEdge,
};
pub use primitive::{Owner, Primitive, PrimitiveKind};
pub use road::{Corner, LineKind, Obb, OffsetLine, Point, Road, Segment};
use slotmap::{new_key_type, SlotMap};
pub use settings::Settings;
pub use trim::{Piece, RemovedInterval, SegmentTrim, TrimOverlap};
pub use util::{stable_hash, Interval};

mod compiler;
mod input;
mod junction;
pub mod math;
mod primitive;
mod road;
pub mod settings;
mod trim;
mod util;

new_key_type! {
    /// Handle of a [Segment] within one compilation.
    pub struct SegmentKey;
    /// Handle of an [EndpointCandidate] within one compilation.
    pub struct EndpointKey;
}

type SegmentSet = SlotMap<SegmentKey, Segment>;
type EndpointSet = SlotMap<EndpointKey, EndpointCandidate>;
