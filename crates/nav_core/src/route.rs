//! Graph edge and route types.
//!
//! Every edge in the connection graph is one of three variants sharing a
//! source and destination [`MapLocation`]. The router and the traversal
//! state machine dispatch on the variant with `match`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{MapId, MapLocation, WorldPosition};
use crate::smoothing::polyline_length;

/// A smoothed walking path within one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldPath {
    /// Where the path starts.
    pub source: MapLocation,
    /// Where the path ends.
    pub dest: MapLocation,
    /// Waypoints from source to destination, at least two.
    pub points: Vec<WorldPosition>,
    /// Traversal cost in world units, weighted by terrain cost.
    pub cost: f32,
}

impl WorldPath {
    /// Map the path lies on.
    #[must_use]
    pub fn map(&self) -> &MapId {
        &self.source.map
    }

    /// Geometric length of the polyline.
    #[must_use]
    pub fn length(&self) -> f32 {
        polyline_length(&self.points)
    }

    /// The same path walked backwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            source: self.dest.clone(),
            dest: self.source.clone(),
            points,
            cost: self.cost,
        }
    }
}

/// How an inter-map connection is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterMapKind {
    /// Walk-through door.
    Door,
    /// Transporter NPC.
    Transporter,
    /// Leave action available anywhere on the map.
    Leave,
}

impl fmt::Display for InterMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Door => "door",
            Self::Transporter => "transporter",
            Self::Leave => "leave",
        };
        f.write_str(name)
    }
}

/// A hop from one map to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterMapEdge {
    /// Where the connection is used.
    pub source: MapLocation,
    /// Spawn the agent arrives at.
    pub dest: MapLocation,
    /// Connection type.
    pub kind: InterMapKind,
    /// Index of the destination spawn on the destination map.
    pub spawn: usize,
}

/// An instantaneous return to the map's town spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportEdge {
    /// Where the teleport is cast.
    pub source: MapLocation,
    /// Default spawn of the map.
    pub dest: MapLocation,
}

/// One edge of the connection graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEdge {
    /// Door, transporter or leave hop between maps.
    InterMap(InterMapEdge),
    /// Walking path within a map. Shared with the path cache.
    IntraMap(Arc<WorldPath>),
    /// Return-to-town teleport.
    Teleport(TeleportEdge),
}

impl GraphEdge {
    /// Source location.
    #[must_use]
    pub fn source(&self) -> &MapLocation {
        match self {
            Self::InterMap(edge) => &edge.source,
            Self::IntraMap(path) => &path.source,
            Self::Teleport(edge) => &edge.source,
        }
    }

    /// Destination location.
    #[must_use]
    pub fn dest(&self) -> &MapLocation {
        match self {
            Self::InterMap(edge) => &edge.dest,
            Self::IntraMap(path) => &path.dest,
            Self::Teleport(edge) => &edge.dest,
        }
    }

    /// The edge's own cost: path cost for walking, 0 otherwise.
    #[must_use]
    pub fn cost(&self) -> f32 {
        match self {
            Self::IntraMap(path) => path.cost,
            Self::InterMap(_) | Self::Teleport(_) => 0.0,
        }
    }

    /// Router weight: a flat hop penalty plus the edge cost.
    #[must_use]
    pub fn weight(&self, hop_penalty: f32) -> f32 {
        hop_penalty + self.cost()
    }

    /// Short label for diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::InterMap(edge) => format!("{} #{}", edge.kind, edge.spawn),
            Self::IntraMap(path) => format!("walk {:.0}", path.cost),
            Self::Teleport(_) => "town".to_string(),
        }
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source(), self.dest(), self.label())
    }
}

/// An ordered, possibly multi-map sequence of edges.
///
/// An empty route means the goal is unreachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Edges in travel order.
    pub edges: Vec<GraphEdge>,
}

impl Route {
    /// Create a route from edges.
    #[must_use]
    pub fn new(edges: Vec<GraphEdge>) -> Self {
        Self { edges }
    }

    /// The unreachable route.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// True when there is no route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Sum of router weights along the route.
    #[must_use]
    pub fn total_cost(&self, hop_penalty: f32) -> f32 {
        self.edges.iter().map(|e| e.weight(hop_penalty)).sum()
    }

    /// Every edge ends on the map the next one starts on.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.edges
            .windows(2)
            .all(|pair| pair[0].dest().map == pair[1].source().map)
    }

    /// Maps visited, in order, without repeats of consecutive entries.
    #[must_use]
    pub fn maps(&self) -> Vec<MapId> {
        let mut maps: Vec<MapId> = Vec::new();
        for edge in &self.edges {
            for map in [&edge.source().map, &edge.dest().map] {
                if maps.last() != Some(map) {
                    maps.push(map.clone());
                }
            }
        }
        maps
    }

    /// Iterate over the edges.
    pub fn iter(&self) -> std::slice::Iter<'_, GraphEdge> {
        self.edges.iter()
    }
}

impl IntoIterator for Route {
    type Item = GraphEdge;
    type IntoIter = std::vec::IntoIter<GraphEdge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(map: &str, from: (f32, f32), to: (f32, f32), cost: f32) -> GraphEdge {
        GraphEdge::IntraMap(Arc::new(WorldPath {
            source: MapLocation::new(map, from.0, from.1),
            dest: MapLocation::new(map, to.0, to.1),
            points: vec![WorldPosition::new(from.0, from.1), WorldPosition::new(to.0, to.1)],
            cost,
        }))
    }

    fn door(from: &str, to: &str) -> GraphEdge {
        GraphEdge::InterMap(InterMapEdge {
            source: MapLocation::new(from, 100.0, 0.0),
            dest: MapLocation::new(to, 0.0, 0.0),
            kind: InterMapKind::Door,
            spawn: 0,
        })
    }

    #[test]
    fn test_route_costs_and_maps() {
        let route = Route::new(vec![
            walk("main", (0.0, 0.0), (100.0, 0.0), 100.0),
            door("main", "cave"),
            walk("cave", (0.0, 0.0), (30.0, 40.0), 50.0),
        ]);

        assert!(route.is_contiguous());
        assert_eq!(route.total_cost(1.0), 153.0);
        assert_eq!(route.maps(), vec![MapId::new("main"), MapId::new("cave")]);
    }

    #[test]
    fn test_discontiguous_route_detected() {
        let route = Route::new(vec![
            walk("main", (0.0, 0.0), (100.0, 0.0), 100.0),
            walk("cave", (0.0, 0.0), (30.0, 40.0), 50.0),
        ]);
        assert!(!route.is_contiguous());
    }

    #[test]
    fn test_reversed_path() {
        let GraphEdge::IntraMap(path) = walk("main", (0.0, 0.0), (30.0, 40.0), 50.0) else {
            unreachable!();
        };
        let back = path.reversed();
        assert_eq!(back.source, path.dest);
        assert_eq!(back.points.first(), path.points.last());
        assert_eq!(back.cost, path.cost);
        assert_eq!(back.length(), 50.0);
    }

    #[test]
    fn test_edge_weights() {
        assert_eq!(door("main", "cave").weight(1.0), 1.0);
        assert_eq!(walk("main", (0.0, 0.0), (1.0, 0.0), 7.5).weight(1.0), 8.5);
    }
}
