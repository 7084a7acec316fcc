//! Coordinate types shared by every navigation layer.
//!
//! World positions are map-local floats as reported by the server. Grid
//! cells are integer (column, row) pairs produced by a map's
//! [`TerrainGrid`](crate::terrain::TerrainGrid).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Distance under which two positions on a map count as the same spot.
pub const POSITION_EPSILON: f32 = 1.0;

/// Map-local world position.
///
/// Equality and hashing are bitwise so positions can key caches and
/// graph vertices. Use [`WorldPosition::equivalent`] for tolerant checks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl WorldPosition {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new world position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance to another position.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Linear interpolation towards `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// True when both coordinates lie within `epsilon` of `other`.
    #[must_use]
    pub fn equivalent(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    /// Position as an `[x, y]` array (spatial index point type).
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl PartialEq for WorldPosition {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for WorldPosition {}

impl Hash for WorldPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Integer grid coordinates, local to one map's terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridCell {
    /// Create a new grid cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Map identifier. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(Arc<str>);

impl MapId {
    /// Create a map identifier from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Map name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MapId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position on a specific map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapLocation {
    /// Map the position belongs to.
    pub map: MapId,
    /// Map-local position.
    pub position: WorldPosition,
}

impl MapLocation {
    /// Create a new map location.
    #[must_use]
    pub fn new(map: impl Into<MapId>, x: f32, y: f32) -> Self {
        Self {
            map: map.into(),
            position: WorldPosition::new(x, y),
        }
    }

    /// Create a map location from an existing position.
    #[must_use]
    pub fn at(map: MapId, position: WorldPosition) -> Self {
        Self { map, position }
    }

    /// Same map and positions within `epsilon` of each other.
    #[must_use]
    pub fn equivalent(&self, other: &Self, epsilon: f32) -> bool {
        self.map == other.map && self.position.equivalent(other.position, epsilon)
    }

    /// Distance to another location, or `None` across maps.
    #[must_use]
    pub fn distance(&self, other: &Self) -> Option<f32> {
        (self.map == other.map).then(|| self.position.distance(other.position))
    }
}

impl fmt::Display for MapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.map, self.position)
    }
}

/// Parameter `t` along `p0`-`p1` where it crosses segment `q0`-`q1`, if it does.
#[must_use]
pub fn segment_intersection(
    p0: WorldPosition,
    p1: WorldPosition,
    q0: WorldPosition,
    q1: WorldPosition,
) -> Option<f32> {
    let rx = p1.x - p0.x;
    let ry = p1.y - p0.y;
    let sx = q1.x - q0.x;
    let sy = q1.y - q0.y;
    let denom = rx * sy - ry * sx;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let qpx = q0.x - p0.x;
    let qpy = q0.y - p0.y;
    let t = (qpx * sy - qpy * sx) / denom;
    let u = (qpx * ry - qpy * rx) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_equivalent_equality() {
        let a = MapLocation::new("main", 10.0, 20.0);
        let b = MapLocation::new("main", 10.4, 19.7);

        assert_ne!(a, b);
        assert!(a.equivalent(&b, 0.5));
        assert!(!a.equivalent(&b, 0.1));
        assert!(!a.equivalent(&MapLocation::new("cave", 10.0, 20.0), 5.0));
    }

    #[test]
    fn test_distance_across_maps() {
        let a = MapLocation::new("main", 0.0, 0.0);
        assert_eq!(a.distance(&MapLocation::new("main", 3.0, 4.0)), Some(5.0));
        assert_eq!(a.distance(&MapLocation::new("cave", 3.0, 4.0)), None);
    }

    #[test]
    fn test_segment_intersection() {
        let t = segment_intersection(
            WorldPosition::new(0.0, 0.0),
            WorldPosition::new(10.0, 0.0),
            WorldPosition::new(4.0, -5.0),
            WorldPosition::new(4.0, 5.0),
        );
        assert!((t.unwrap() - 0.4).abs() < 1e-5);

        let miss = segment_intersection(
            WorldPosition::new(0.0, 0.0),
            WorldPosition::new(3.0, 0.0),
            WorldPosition::new(4.0, -5.0),
            WorldPosition::new(4.0, 5.0),
        );
        assert!(miss.is_none());
    }
}
