//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
use serde::Serialize;

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval overlaps with the other.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max > other.min && other.max > self.min
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Float> Interval<T> {
    /// Clamps both ends of the interval into `bounds`.
    pub fn clamp_to(&self, bounds: Self) -> Self {
        Self {
            min: self.min.max(bounds.min).min(bounds.max),
            max: self.max.max(bounds.min).min(bounds.max),
        }
    }

    /// The smallest interval containing both this interval and the value.
    pub fn include(&self, value: T) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// The value at fraction `t` of the way from `min` to `max`.
    pub fn lerp(&self, t: T) -> T {
        self.min + t * (self.max - self.min)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// Iterates `0..count` starting at `start` and wrapping around.
pub fn rotated_range(count: usize, start: usize) -> impl Iterator<Item = usize> {
    (0..count)
        .map(move |i| i + start)
        .map(move |i| if i >= count { i - count } else { i })
}

/// A content hash of a list of strings, stable across runs, platforms and crate versions
/// (32-bit FNV-1a over the parts, separated by `|`).
pub fn stable_hash<S: AsRef<str>>(parts: &[S]) -> String {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = OFFSET;
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hash = (hash ^ u32::from(b'|')).wrapping_mul(PRIME);
        }
        for byte in part.as_ref().bytes() {
            hash = (hash ^ u32::from(byte)).wrapping_mul(PRIME);
        }
    }
    format!("{:08x}", hash)
}

/// Serializes points as `{ "x": .., "z": .. }` objects.
pub(crate) mod xz {
    use crate::math::Point2d;
    use serde::ser::{SerializeStruct, Serializer};

    pub fn serialize<S: Serializer>(point: &Point2d, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Xz", 2)?;
        st.serialize_field("x", &point.x)?;
        st.serialize_field("z", &point.y)?;
        st.end()
    }

    #[derive(serde::Serialize)]
    pub(crate) struct Xz {
        x: f64,
        z: f64,
    }

    impl From<&Point2d> for Xz {
        fn from(p: &Point2d) -> Self {
            Self { x: p.x, z: p.y }
        }
    }
}

/// Serializes sequences of points as arrays of `{ "x": .., "z": .. }` objects.
pub(crate) mod xz_seq {
    use super::xz::Xz;
    use crate::math::Point2d;
    use serde::ser::Serializer;

    pub fn serialize<S, P>(points: &P, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        P: AsRef<[Point2d]>,
    {
        s.collect_seq(points.as_ref().iter().map(Xz::from))
    }
}

/// Serializes direction vectors as `{ "x": .., "z": .. }` objects.
pub(crate) mod xz_vec {
    use crate::math::{Point2d, Vector2d};
    use cgmath::EuclideanSpace;
    use serde::ser::Serializer;

    pub fn serialize<S: Serializer>(vec: &Vector2d, s: S) -> Result<S::Ok, S::Error> {
        super::xz::serialize(&Point2d::from_vec(*vec), s)
    }
}
